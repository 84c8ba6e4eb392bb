use crate::include_processor::SectionCompiler;
use crate::parser::{Expr, KeyField, MergeMode, SectionKind, Statement, StatementKind, VarDef};
use std::collections::BTreeMap;
use xkbrev_core::{is_keypad, Key, KeyType, KeycodeMap, KeysymTable, LayoutModel, XkbError};

/// Symbols and type of one key, before types are resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyInfo {
    pub name: String,
    pub type_name: Option<String>,
    pub levels: Vec<Option<String>>,
}

impl KeyInfo {
    /// Fold `other` into this key.
    ///
    /// Override takes every level `other` defines, augment only fills empty
    /// ones, replace swaps the key wholesale.
    pub fn merge(&mut self, other: KeyInfo, mode: MergeMode) {
        if mode == MergeMode::Replace {
            *self = other;
            return;
        }

        let clobber = mode.clobbers();
        if self.levels.len() < other.levels.len() {
            self.levels.resize(other.levels.len(), None);
        }
        for (slot, level) in self.levels.iter_mut().zip(other.levels) {
            if level.is_some() && (clobber || slot.is_none()) {
                *slot = level;
            }
        }

        if other.type_name.is_some() && (clobber || self.type_name.is_none()) {
            self.type_name = other.type_name;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolsInfo {
    /// `name[Group1]`
    pub description: Option<String>,
    pub keys: BTreeMap<String, KeyInfo>,
    pub modifier_map: BTreeMap<String, Vec<String>>,
    /// `key.type` default for the keys that follow in the same section
    default_type: Option<String>,
}

impl SymbolsInfo {
    fn add_key(&mut self, key: KeyInfo, merge: MergeMode) {
        match self.keys.get_mut(&key.name) {
            Some(existing) => existing.merge(key, merge),
            None => {
                self.keys.insert(key.name.clone(), key);
            }
        }
    }

    fn add_modifier_map(&mut self, modifier: &str, entry: String, merge: MergeMode) {
        // An entry belongs to a single modifier
        for (other, entries) in self.modifier_map.iter_mut() {
            if other != modifier && entries.contains(&entry) {
                if !merge.clobbers() {
                    return;
                }
                entries.retain(|e| *e != entry);
            }
        }
        self.modifier_map.retain(|_, entries| !entries.is_empty());

        let entries = self.modifier_map.entry(modifier.to_string()).or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
}

pub struct SymbolsCompiler;

impl SymbolsCompiler {
    fn compile_key(
        &self,
        name: &str,
        fields: &[KeyField],
        default_type: Option<&String>,
        file: &str,
        line: usize,
    ) -> Result<KeyInfo, XkbError> {
        let mut key = KeyInfo {
            name: name.to_string(),
            type_name: None,
            levels: Vec::new(),
        };
        let mut bare_groups = 0u32;

        for field in fields {
            match field {
                KeyField::Symbols(symbols) => {
                    bare_groups += 1;
                    if bare_groups == 1 {
                        key.levels = self.levels(name, symbols, file, line)?;
                    } else {
                        log::debug!("<{}>: ignoring symbols of group {}", name, bare_groups);
                    }
                }
                KeyField::Var(var) if var.lhs.is(None, "symbols") => {
                    if !Self::first_group(var) {
                        continue;
                    }
                    match &var.value {
                        Expr::List(symbols) => key.levels = self.levels(name, symbols, file, line)?,
                        _ => {
                            return Err(XkbError::parse(file, line, format!("<{}>: symbols must be a list", name)));
                        }
                    }
                }
                KeyField::Var(var) if var.lhs.is(None, "type") => {
                    if !Self::first_group(var) {
                        continue;
                    }
                    let type_name = var.value.as_str().ok_or_else(|| {
                        XkbError::parse(file, line, format!("<{}>: type must be a string", name))
                    })?;
                    key.type_name = Some(type_name.to_string());
                }
                // actions, virtualMods, repeat and the like do not affect symbols
                KeyField::Var(_) => {}
            }
        }

        if key.type_name.is_none() {
            key.type_name = default_type.cloned();
        }
        Ok(key)
    }

    fn levels(&self, key: &str, symbols: &[Expr], file: &str, line: usize) -> Result<Vec<Option<String>>, XkbError> {
        symbols
            .iter()
            .map(|symbol| match symbol {
                Expr::List(choices) => {
                    // { a, b } emits several keysyms; only the first is kept
                    log::debug!("<{}>: multiple keysyms on one level, keeping the first", key);
                    Ok(choices.first().and_then(Expr::keysym_name))
                }
                other => other
                    .keysym_name()
                    .map(|name| Some(name).filter(|n| n != "NoSymbol"))
                    .ok_or_else(|| XkbError::parse(file, line, format!("<{}>: invalid keysym {:?}", key, other))),
            })
            .collect()
    }

    /// Whether an indexed key field addresses the first group
    fn first_group(var: &VarDef) -> bool {
        match var.lhs.index.as_deref() {
            None => true,
            Some(index) => index.ordinal("Group") == Some(1),
        }
    }
}

impl SectionCompiler for SymbolsCompiler {
    const KIND: SectionKind = SectionKind::Symbols;
    type Info = SymbolsInfo;

    fn statement(
        &mut self,
        info: &mut SymbolsInfo,
        statement: &Statement,
        merge: MergeMode,
        file: &str,
    ) -> Result<(), XkbError> {
        match &statement.kind {
            StatementKind::Key { name, fields } => {
                let key = self.compile_key(name, fields, info.default_type.as_ref(), file, statement.line)?;
                info.add_key(key, merge);
            }
            StatementKind::Var(var) if var.lhs.is(None, "name") => {
                if !Self::first_group(var) {
                    return Ok(());
                }
                if let Some(description) = var.value.as_str() {
                    if info.description.is_none() || merge.clobbers() {
                        info.description = Some(description.to_string());
                    }
                }
            }
            StatementKind::Var(var) if var.lhs.is(Some("key"), "type") => {
                if Self::first_group(var) {
                    info.default_type = var.value.as_str().map(str::to_string);
                }
            }
            StatementKind::ModifierMap { modifier, keys } => {
                for key in keys {
                    let entry = match key {
                        Expr::KeyName(name) => format!("<{}>", name),
                        other => match other.keysym_name() {
                            Some(keysym) => keysym,
                            None => continue,
                        },
                    };
                    info.add_modifier_map(modifier, entry, merge);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn merge(&mut self, into: &mut SymbolsInfo, from: SymbolsInfo, mode: MergeMode) {
        if from.description.is_some() && (into.description.is_none() || mode.clobbers()) {
            into.description = from.description;
        }
        for key in from.keys.into_values() {
            into.add_key(key, mode);
        }
        for (modifier, entries) in from.modifier_map {
            for entry in entries {
                into.add_modifier_map(&modifier, entry, mode);
            }
        }
    }
}

/// Key type for a key without an explicit one, chosen from its symbols
fn automatic_type(levels: &[Option<String>], keysyms: &KeysymTable) -> &'static str {
    let sym = |i: usize| levels.get(i).and_then(|s| s.as_deref());
    let lower = |i: usize| sym(i).is_some_and(|s| keysyms.is_lower(s));
    let upper = |i: usize| sym(i).is_some_and(|s| keysyms.is_upper(s));
    let keypad = |i: usize| sym(i).is_some_and(is_keypad);

    let first_pair_alpha = lower(0) && upper(1);
    let second_pair_alpha = lower(2) && upper(3);

    match levels.len() {
        0 | 1 => "ONE_LEVEL",
        2 if first_pair_alpha => "ALPHABETIC",
        2 if keypad(0) || keypad(1) => "KEYPAD",
        2 => "TWO_LEVEL",
        3 | 4 if first_pair_alpha && second_pair_alpha => "FOUR_LEVEL_ALPHABETIC",
        3 | 4 if first_pair_alpha => "FOUR_LEVEL_SEMIALPHABETIC",
        3 | 4 if keypad(0) || keypad(1) => "FOUR_LEVEL_KEYPAD",
        3 | 4 => "FOUR_LEVEL",
        _ if first_pair_alpha && second_pair_alpha => "EIGHT_LEVEL_ALPHABETIC",
        _ if first_pair_alpha => "EIGHT_LEVEL_SEMIALPHABETIC",
        _ => "EIGHT_LEVEL",
    }
}

/// Resolve the compiled symbols against key types and keycodes
pub fn build_model(
    symbols_expr: &str,
    info: SymbolsInfo,
    types: &BTreeMap<String, KeyType>,
    keycodes: &KeycodeMap,
    keysyms: &KeysymTable,
) -> Result<LayoutModel, XkbError> {
    let mut model = LayoutModel {
        symbols: symbols_expr.to_string(),
        description: info.description,
        modifier_map: info.modifier_map,
        ..LayoutModel::default()
    };

    // Aliases and real names may both be used; fold them together
    let mut keys: BTreeMap<String, KeyInfo> = BTreeMap::new();
    for (name, mut key) in info.keys {
        let canonical = keycodes.canonical(&name).to_string();
        if canonical != name {
            log::debug!("<{}> is an alias of <{}>", name, canonical);
        }
        if keycodes.code(&canonical).is_none() {
            log::debug!("<{}> has no keycode", canonical);
        }
        key.name = canonical.clone();
        match keys.get_mut(&canonical) {
            Some(existing) => existing.merge(key, MergeMode::Override),
            None => {
                keys.insert(canonical, key);
            }
        }
    }

    for (name, key) in keys {
        let mut levels = key.levels;
        while levels.last().is_some_and(|level| level.is_none()) {
            levels.pop();
        }
        if levels.first().map_or(true, |level| level.is_none()) {
            // pc gives the virtual modifier keys (<ALT>, <META>) no base symbol
            log::debug!("Key <{}> has no base symbol; dropped", name);
            continue;
        }

        let type_name = match key.type_name {
            Some(type_name) => type_name,
            None => automatic_type(&levels, keysyms).to_string(),
        };
        let key_type = types
            .get(&type_name)
            .ok_or_else(|| XkbError::not_found("key type", type_name.clone()))?;

        if levels.len() > key_type.num_levels {
            log::warn!(
                "Key <{}> has {} levels but type {} only {}; extra symbols dropped",
                name,
                levels.len(),
                type_name,
                key_type.num_levels
            );
            levels.truncate(key_type.num_levels);
        }

        log::debug!("<{}> {} {:?}", name, type_name, levels);
        model
            .types
            .entry(type_name.clone())
            .or_insert_with(|| key_type.clone());
        model.keys.insert(
            name.clone(),
            Key {
                name,
                type_name,
                levels,
            },
        );
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> SymbolsInfo {
        let file = Parser::new(source, "symbols/test").parse().unwrap();
        let mut info = SymbolsInfo::default();
        for statement in &file.sections[0].statements {
            let merge = match statement.merge {
                MergeMode::Default => MergeMode::Override,
                explicit => explicit,
            };
            SymbolsCompiler
                .statement(&mut info, statement, merge, "symbols/test")
                .unwrap();
        }
        info
    }

    fn levels(names: &[&str]) -> Vec<Option<String>> {
        names
            .iter()
            .map(|n| if *n == "NoSymbol" { None } else { Some(n.to_string()) })
            .collect()
    }

    fn keysyms() -> KeysymTable {
        let mut table = KeysymTable::new();
        for (name, code) in [("a", 0x61), ("A", 0x41), ("1", 0x31), ("exclam", 0x21), ("ae", 0xe6), ("AE", 0xc6)] {
            table.insert(name, code, Some(code));
        }
        table.insert("KP_1", 0xffb1, None);
        table.insert("KP_End", 0xff9c, None);
        table
    }

    fn types(names: &[(&str, usize)]) -> BTreeMap<String, KeyType> {
        names
            .iter()
            .map(|(name, levels)| {
                let mut key_type = KeyType::new(name);
                key_type.num_levels = *levels;
                (name.to_string(), key_type)
            })
            .collect()
    }

    #[test]
    fn test_key_fields() {
        let info = compile(
            r#"xkb_symbols "t" {
                name[Group1] = "Test";
                key <AE01> { [ 1, exclam ] };
                key <RALT> { type[Group1] = "ONE_LEVEL", symbols[Group1] = [ ISO_Level3_Shift ] };
                key.type[Group1] = "FOUR_LEVEL";
                key <AC01> { [ a, A, ae, AE ], [ x, X ] };
                key <AB01> { [ NoSymbol, Z ] };
                modifier_map Mod5 { <RALT>, ISO_Level3_Shift };
            };"#,
        );

        assert_eq!(info.description.as_deref(), Some("Test"));
        assert_eq!(info.keys["AE01"].levels, levels(&["1", "exclam"]));
        assert_eq!(info.keys["AE01"].type_name, None);
        assert_eq!(info.keys["RALT"].type_name.as_deref(), Some("ONE_LEVEL"));
        assert_eq!(info.keys["AC01"].type_name.as_deref(), Some("FOUR_LEVEL"));
        assert_eq!(info.keys["AC01"].levels, levels(&["a", "A", "ae", "AE"]));
        assert_eq!(info.keys["AB01"].levels, levels(&["NoSymbol", "Z"]));
        assert_eq!(info.modifier_map["Mod5"], vec!["<RALT>", "ISO_Level3_Shift"]);
    }

    #[test]
    fn test_level_merge_modes() {
        let base = KeyInfo {
            name: "AE05".into(),
            type_name: None,
            levels: levels(&["5", "percent"]),
        };
        let extra = KeyInfo {
            name: "AE05".into(),
            type_name: Some("FOUR_LEVEL".into()),
            levels: levels(&["NoSymbol", "NoSymbol", "EuroSign"]),
        };

        let mut key = base.clone();
        key.merge(extra.clone(), MergeMode::Override);
        assert_eq!(key.levels, levels(&["5", "percent", "EuroSign"]));
        assert_eq!(key.type_name.as_deref(), Some("FOUR_LEVEL"));

        let mut key = base.clone();
        key.merge(
            KeyInfo {
                levels: levels(&["6", "asciicircum", "EuroSign"]),
                ..extra.clone()
            },
            MergeMode::Augment,
        );
        assert_eq!(key.levels, levels(&["5", "percent", "EuroSign"]));

        let mut key = base;
        key.merge(extra.clone(), MergeMode::Replace);
        assert_eq!(key, extra);
    }

    #[test]
    fn test_automatic_types() {
        let table = keysyms();
        assert_eq!(automatic_type(&levels(&["1"]), &table), "ONE_LEVEL");
        assert_eq!(automatic_type(&levels(&["a", "A"]), &table), "ALPHABETIC");
        assert_eq!(automatic_type(&levels(&["1", "exclam"]), &table), "TWO_LEVEL");
        assert_eq!(automatic_type(&levels(&["KP_End", "KP_1"]), &table), "KEYPAD");
        assert_eq!(automatic_type(&levels(&["a", "A", "ae", "AE"]), &table), "FOUR_LEVEL_ALPHABETIC");
        assert_eq!(automatic_type(&levels(&["a", "A", "1"]), &table), "FOUR_LEVEL_SEMIALPHABETIC");
        assert_eq!(automatic_type(&levels(&["1", "exclam", "a"]), &table), "FOUR_LEVEL");
        assert_eq!(
            automatic_type(&levels(&["1", "exclam", "a", "A", "1"]), &table),
            "EIGHT_LEVEL"
        );
    }

    #[test]
    fn test_build_model() {
        let mut info = compile(
            r#"xkb_symbols "t" {
                key <AE01> { [ 1, exclam, a, A, 1 ] };
                key <AC12> { [ a, A ] };
                key <AB01> { [ NoSymbol, A ] };
                key <AE02> { [ 1, exclam, NoSymbol, NoSymbol ] };
            };"#,
        );
        info.keys.get_mut("AE01").unwrap().type_name = Some("TWO_LEVEL".into());

        let mut keycodes = KeycodeMap::new("t");
        keycodes.codes.insert("AE01".into(), 10);
        keycodes.codes.insert("AE02".into(), 11);
        keycodes.codes.insert("BKSL".into(), 51);
        keycodes.aliases.insert("AC12".into(), "BKSL".into());

        let model = build_model(
            "t",
            info,
            &types(&[("TWO_LEVEL", 2), ("ALPHABETIC", 2)]),
            &keycodes,
            &keysyms(),
        )
        .unwrap();

        assert_eq!(model.keys.len(), 3);
        assert_eq!(model.keys["AE01"].levels, levels(&["1", "exclam"]));
        assert_eq!(model.keys["BKSL"].type_name, "ALPHABETIC");
        assert_eq!(model.keys["AE02"].type_name, "TWO_LEVEL");
        assert!(model.key("AB01").is_none());
        assert!(model.unresolved_keys().is_empty());
        assert_eq!(model.types.len(), 2);
    }

    #[test]
    fn test_undefined_type() {
        let info = compile(r#"xkb_symbols { key <AE01> { type = "NOPE", [ 1 ] }; };"#);
        let result = build_model("t", info, &types(&[]), &KeycodeMap::new("t"), &keysyms());
        match result {
            Err(XkbError::NotFound { kind, name }) => {
                assert_eq!(kind, "key type");
                assert_eq!(name, "NOPE");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}

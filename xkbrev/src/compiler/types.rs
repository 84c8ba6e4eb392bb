use super::{known_mods, level_index, mod_mask};
use crate::include_processor::SectionCompiler;
use crate::parser::{MergeMode, SectionKind, Statement, StatementKind, VarDef};
use std::collections::BTreeMap;
use xkbrev_core::{KeyType, XkbError};

#[derive(Debug, Clone, Default)]
pub struct TypesInfo {
    pub types: BTreeMap<String, KeyType>,
}

impl TypesInfo {
    fn add(&mut self, key_type: KeyType, merge: MergeMode) {
        if self.types.contains_key(&key_type.name) && !merge.clobbers() {
            return;
        }
        self.types.insert(key_type.name.clone(), key_type);
    }
}

pub struct TypesCompiler;

impl TypesCompiler {
    fn compile_type(&self, name: &str, fields: &[VarDef], file: &str, line: usize) -> Result<KeyType, XkbError> {
        let mut key_type = KeyType::new(name);
        let mut highest = 0;

        for field in fields {
            let lhs = &field.lhs;
            if lhs.is(None, "modifiers") {
                key_type.modifiers = known_mods(&field.value);
                if mod_mask(&field.value).is_none() {
                    log::debug!("{}: type \"{}\" uses modifiers outside the known set", file, name);
                }
            } else if lhs.is(None, "map") {
                let index = lhs
                    .index
                    .as_deref()
                    .ok_or_else(|| XkbError::parse(file, line, "map entry needs a modifier index"))?;
                let level = level_index(&field.value).ok_or_else(|| {
                    XkbError::parse(file, line, format!("Invalid level in type \"{}\"", name))
                })?;
                let Some(mask) = mod_mask(index) else {
                    log::debug!("{}: type \"{}\" map entry {:?} uses unknown modifiers", file, name, index);
                    continue;
                };
                highest = highest.max(level);
                match key_type.map.iter_mut().find(|(m, _)| *m == mask) {
                    Some(entry) => entry.1 = level,
                    None => key_type.map.push((mask, level)),
                }
            } else if lhs.is(None, "level_name") {
                let level = lhs
                    .index
                    .as_deref()
                    .and_then(level_index)
                    .ok_or_else(|| XkbError::parse(file, line, "level_name needs a level index"))?;
                if let Some(label) = field.value.as_str() {
                    highest = highest.max(level);
                    key_type.level_names.insert(level, label.to_string());
                }
            }
            // preserve[] only matters for consumed modifiers
        }

        key_type.num_levels = highest + 1;
        Ok(key_type)
    }
}

impl SectionCompiler for TypesCompiler {
    const KIND: SectionKind = SectionKind::Types;
    type Info = TypesInfo;

    fn statement(
        &mut self,
        info: &mut TypesInfo,
        statement: &Statement,
        merge: MergeMode,
        file: &str,
    ) -> Result<(), XkbError> {
        if let StatementKind::Type { name, fields } = &statement.kind {
            let key_type = self.compile_type(name, fields, file, statement.line)?;
            info.add(key_type, merge);
        }
        Ok(())
    }

    fn merge(&mut self, into: &mut TypesInfo, from: TypesInfo, mode: MergeMode) {
        for key_type in from.types.into_values() {
            into.add(key_type, mode);
        }
    }
}

use crate::include_processor::SectionCompiler;
use crate::parser::{Expr, MergeMode, SectionKind, Statement, StatementKind};
use std::collections::BTreeMap;
use xkbrev_core::{KeycodeMap, XkbError};

#[derive(Debug, Clone, Default)]
pub struct KeycodesInfo {
    pub minimum: Option<u32>,
    pub maximum: Option<u32>,
    pub codes: BTreeMap<String, u32>,
    pub aliases: BTreeMap<String, String>,
}

impl KeycodesInfo {
    fn add_code(&mut self, name: &str, code: u32, merge: MergeMode) {
        if let Some(&existing) = self.codes.get(name) {
            if existing == code || !merge.clobbers() {
                return;
            }
            log::debug!("<{}> redefined from {} to {}", name, existing, code);
        }

        // A keycode belongs to one key name at a time
        if let Some(other) = self
            .codes
            .iter()
            .find(|(other, c)| **c == code && other.as_str() != name)
            .map(|(other, _)| other.clone())
        {
            if !merge.clobbers() {
                return;
            }
            log::warn!("Keycode {} moves from <{}> to <{}>", code, other, name);
            self.codes.remove(&other);
        }

        self.codes.insert(name.to_string(), code);
    }

    fn add_alias(&mut self, alias: &str, real: &str, merge: MergeMode) {
        if self.aliases.contains_key(alias) && !merge.clobbers() {
            return;
        }
        self.aliases.insert(alias.to_string(), real.to_string());
    }

    pub fn finish(self, name: &str) -> KeycodeMap {
        let mut map = KeycodeMap::new(name);
        if let Some(minimum) = self.minimum {
            map.minimum = minimum;
        }
        if let Some(maximum) = self.maximum {
            map.maximum = maximum;
        }

        for (alias, real) in self.aliases {
            if self.codes.contains_key(&alias) {
                log::debug!("Alias <{}> shadows a real key; ignored", alias);
                continue;
            }
            map.aliases.insert(alias, real);
        }
        map.codes = self.codes;
        map
    }
}

pub struct KeycodesCompiler;

impl SectionCompiler for KeycodesCompiler {
    const KIND: SectionKind = SectionKind::Keycodes;
    type Info = KeycodesInfo;

    fn statement(
        &mut self,
        info: &mut KeycodesInfo,
        statement: &Statement,
        merge: MergeMode,
        file: &str,
    ) -> Result<(), XkbError> {
        match &statement.kind {
            StatementKind::Keycode { name, code } => {
                let code = u32::try_from(*code)
                    .ok()
                    .filter(|c| *c <= 0xffff)
                    .ok_or_else(|| {
                        XkbError::parse(file, statement.line, format!("Keycode {} out of range", code))
                    })?;
                info.add_code(name, code, merge);
            }
            StatementKind::Alias { alias, real } => info.add_alias(alias, real, merge),
            StatementKind::Var(var) if var.lhs.is(None, "minimum") || var.lhs.is(None, "maximum") => {
                let value = match var.value {
                    Expr::Integer(n) => u32::try_from(n).ok(),
                    _ => None,
                }
                .ok_or_else(|| {
                    XkbError::parse(file, statement.line, format!("Invalid {} keycode", var.lhs.field))
                })?;
                let slot = if var.lhs.is(None, "minimum") {
                    &mut info.minimum
                } else {
                    &mut info.maximum
                };
                if slot.is_none() || merge.clobbers() {
                    *slot = Some(value);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn merge(&mut self, into: &mut KeycodesInfo, from: KeycodesInfo, mode: MergeMode) {
        for (name, code) in from.codes {
            into.add_code(&name, code, mode);
        }
        for (alias, real) in from.aliases {
            into.add_alias(&alias, &real, mode);
        }
        if from.minimum.is_some() && (into.minimum.is_none() || mode.clobbers()) {
            into.minimum = from.minimum;
        }
        if from.maximum.is_some() && (into.maximum.is_none() || mode.clobbers()) {
            into.maximum = from.maximum;
        }
    }
}

use super::modifier::ModMask;
use std::collections::BTreeMap;
use std::fmt;

/// Model, layout, variant and options as given to setxkbmap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRequest {
    pub model: String,
    pub layout: String,
    pub variant: Option<String>,
    pub options: Vec<String>,
}

impl LayoutRequest {
    pub fn new(model: &str, layout: &str) -> Self {
        Self {
            model: model.to_string(),
            layout: layout.to_string(),
            variant: None,
            options: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_string());
        self
    }

    pub fn with_option(mut self, option: &str) -> Self {
        self.options.push(option.to_string());
        self
    }

    pub fn variant(&self) -> &str {
        self.variant.as_deref().unwrap_or("")
    }
}

impl fmt::Display for LayoutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layout)?;
        if let Some(variant) = self.variant.as_deref().filter(|v| !v.is_empty()) {
            write!(f, "({})", variant)?;
        }
        Ok(())
    }
}

/// A key type: which modifiers select which level
#[derive(Debug, Clone, PartialEq)]
pub struct KeyType {
    pub name: String,
    pub modifiers: ModMask,
    /// Modifier combination to zero-based level, in declaration order
    pub map: Vec<(ModMask, usize)>,
    pub num_levels: usize,
    pub level_names: BTreeMap<usize, String>,
}

impl KeyType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modifiers: ModMask::NONE,
            map: Vec::new(),
            num_levels: 1,
            level_names: BTreeMap::new(),
        }
    }

    /// Level selected when `active` modifiers are held
    pub fn level(&self, active: ModMask) -> usize {
        let relevant = active.intersect(self.modifiers);
        self.map
            .iter()
            .find(|(mods, _)| *mods == relevant)
            .map(|(_, level)| *level)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub name: String,
    pub type_name: String,
    /// Keysym name per level; `None` is NoSymbol
    pub levels: Vec<Option<String>>,
}

impl Key {
    pub fn base_symbol(&self) -> Option<&str> {
        self.levels.first().and_then(|s| s.as_deref())
    }
}

/// Compiled single-group layout
#[derive(Debug, Clone, Default)]
pub struct LayoutModel {
    /// Component expression the symbols were compiled from
    pub symbols: String,
    /// `name[Group1]` of the layout
    pub description: Option<String>,
    pub keys: BTreeMap<String, Key>,
    pub types: BTreeMap<String, KeyType>,
    /// `modifier_map` entries: modifier name to keys or keysyms
    pub modifier_map: BTreeMap<String, Vec<String>>,
}

impl LayoutModel {
    pub fn key(&self, name: &str) -> Option<&Key> {
        self.keys.get(name)
    }

    pub fn key_type(&self, key: &Key) -> Option<&KeyType> {
        self.types.get(&key.type_name)
    }

    /// Keysym produced by `key` while `active` modifiers are held
    pub fn symbol(&self, key: &str, active: ModMask) -> Option<&str> {
        let key = self.keys.get(key)?;
        let level = self.key_type(key).map(|t| t.level(active)).unwrap_or(0);
        key.levels.get(level).and_then(|s| s.as_deref())
    }

    /// Keys whose first level has no symbol
    pub fn unresolved_keys(&self) -> Vec<&str> {
        self.keys
            .values()
            .filter(|k| k.base_symbol().is_none())
            .map(|k| k.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::modifier::Modifier;

    fn alphabetic() -> KeyType {
        let mut key_type = KeyType::new("ALPHABETIC");
        key_type.modifiers = ModMask::from(Modifier::Shift).with(Modifier::Lock);
        key_type.map.push((ModMask::from(Modifier::Shift), 1));
        key_type.map.push((ModMask::from(Modifier::Lock), 1));
        key_type.num_levels = 2;
        key_type
    }

    #[test]
    fn test_level_selection() {
        let key_type = alphabetic();
        assert_eq!(key_type.level(ModMask::NONE), 0);
        assert_eq!(key_type.level(Modifier::Shift.into()), 1);
        assert_eq!(key_type.level(Modifier::Lock.into()), 1);
        // Shift+Lock has no entry of its own
        assert_eq!(key_type.level(ModMask::from(Modifier::Shift).with(Modifier::Lock)), 0);
        // Irrelevant modifiers are masked out
        assert_eq!(key_type.level(ModMask::from(Modifier::Shift).with(Modifier::LevelThree)), 1);
    }

    #[test]
    fn test_symbol_lookup() {
        let mut model = LayoutModel::default();
        model.types.insert("ALPHABETIC".into(), alphabetic());
        model.keys.insert(
            "AD01".into(),
            Key {
                name: "AD01".into(),
                type_name: "ALPHABETIC".into(),
                levels: vec![Some("q".into()), Some("Q".into())],
            },
        );

        assert_eq!(model.symbol("AD01", ModMask::NONE), Some("q"));
        assert_eq!(model.symbol("AD01", Modifier::Lock.into()), Some("Q"));
        assert_eq!(model.symbol("AD02", ModMask::NONE), None);
        assert!(model.unresolved_keys().is_empty());
    }

    #[test]
    fn test_request_display() {
        let request = LayoutRequest::new("pc105", "us").with_variant("dvp");
        assert_eq!(request.to_string(), "us(dvp)");
        assert_eq!(LayoutRequest::new("pc105", "de").to_string(), "de");
    }
}

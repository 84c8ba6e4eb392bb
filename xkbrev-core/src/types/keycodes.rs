use std::collections::BTreeMap;

/// Compiled `xkb_keycodes` section
#[derive(Debug, Clone, Default)]
pub struct KeycodeMap {
    pub name: String,
    pub minimum: u32,
    pub maximum: u32,
    /// Key name to scancode
    pub codes: BTreeMap<String, u32>,
    /// Alias name to real key name
    pub aliases: BTreeMap<String, String>,
}

impl KeycodeMap {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            minimum: 8,
            maximum: 255,
            codes: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn code(&self, key: &str) -> Option<u32> {
        self.codes
            .get(key)
            .or_else(|| self.aliases.get(key).and_then(|real| self.codes.get(real)))
            .copied()
    }

    /// Resolve an alias to the key name it stands for
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        if self.codes.contains_key(key) {
            return key;
        }
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// All aliases that point at `key`
    pub fn aliases_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.aliases
            .iter()
            .filter(move |(_, real)| real.as_str() == key)
            .map(|(alias, _)| alias.as_str())
    }

    /// Table indexed by scancode with the key name assigned to it
    pub fn by_scancode(&self) -> Vec<Option<&str>> {
        let size = self
            .codes
            .values()
            .copied()
            .max()
            .unwrap_or(0)
            .max(self.maximum) as usize
            + 1;
        let mut table = vec![None; size];
        for (name, &code) in &self.codes {
            table[code as usize] = Some(name.as_str());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeycodeMap {
        let mut map = KeycodeMap::new("test");
        map.codes.insert("AE01".into(), 10);
        map.codes.insert("BKSL".into(), 51);
        map.aliases.insert("AC12".into(), "BKSL".into());
        map
    }

    #[test]
    fn test_alias_lookup() {
        let map = sample();
        assert_eq!(map.code("AC12"), Some(51));
        assert_eq!(map.canonical("AC12"), "BKSL");
        assert_eq!(map.canonical("AE01"), "AE01");
        assert_eq!(map.aliases_of("BKSL").collect::<Vec<_>>(), vec!["AC12"]);
    }

    #[test]
    fn test_by_scancode() {
        let map = sample();
        let table = map.by_scancode();
        assert_eq!(table.len(), 256);
        assert_eq!(table[10], Some("AE01"));
        assert_eq!(table[11], None);
    }
}

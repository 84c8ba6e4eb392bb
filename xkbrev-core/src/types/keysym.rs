use std::collections::{BTreeMap, HashMap};

/// Base of the keysym range that encodes Unicode code points directly
pub const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysymInfo {
    pub code: u32,
    pub unicode: Option<u32>,
}

/// Keysym names as declared in `keysymdef.h`
#[derive(Debug, Clone, Default)]
pub struct KeysymTable {
    entries: HashMap<String, KeysymInfo>,
    // One entry per code: the first with a code point, else the first declared
    by_code: BTreeMap<u32, KeysymInfo>,
}

impl KeysymTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, code: u32, unicode: Option<u32>) {
        let info = KeysymInfo { code, unicode };
        self.entries.insert(name.to_string(), info);
        self.by_code
            .entry(code)
            .and_modify(|known| {
                if known.unicode.is_none() && unicode.is_some() {
                    *known = info;
                }
            })
            .or_insert(info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<KeysymInfo> {
        if let Some(info) = self.entries.get(name) {
            return Some(*info);
        }
        if name == "NoSymbol" {
            return Some(KeysymInfo { code: 0, unicode: None });
        }

        // U20AC style names carry their code point
        if let Some(hex) = name.strip_prefix('U') {
            if hex.len() >= 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                let cp = u32::from_str_radix(hex, 16).ok()?;
                char::from_u32(cp)?;
                return Some(KeysymInfo {
                    code: UNICODE_KEYSYM_OFFSET + cp,
                    unicode: Some(cp),
                });
            }
        }

        // Numeric keysyms
        if let Some(hex) = name.strip_prefix("0x") {
            let code = u32::from_str_radix(hex, 16).ok()?;
            return Some(self.from_code(code));
        }

        None
    }

    /// Describe a raw keysym value
    pub fn from_code(&self, code: u32) -> KeysymInfo {
        if let Some(info) = self.by_code.get(&code) {
            return *info;
        }
        let unicode = if code > UNICODE_KEYSYM_OFFSET {
            Some(code - UNICODE_KEYSYM_OFFSET)
        } else if (0x20..=0x7e).contains(&code) || (0xa0..=0xff).contains(&code) {
            // Latin-1 keysyms equal their code points
            Some(code)
        } else {
            None
        };
        KeysymInfo { code, unicode }
    }

    /// Character the keysym produces, if any
    pub fn to_char(&self, name: &str) -> Option<char> {
        self.lookup(name)?.unicode.and_then(char::from_u32)
    }

    pub fn is_lower(&self, name: &str) -> bool {
        self.to_char(name)
            .map(|c| c.is_lowercase() && c.to_uppercase().next() != Some(c))
            .unwrap_or(false)
    }

    pub fn is_upper(&self, name: &str) -> bool {
        self.to_char(name)
            .map(|c| c.is_uppercase() && c.to_lowercase().next() != Some(c))
            .unwrap_or(false)
    }
}

/// Keypad keysyms select the keypad key types
pub fn is_keypad(name: &str) -> bool {
    name.starts_with("KP_")
}

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use xkbrev_core::{KeysymTable, XkbError};

// #define XK_EuroSign   0x20ac  /* U+20AC EURO SIGN */
// Deprecated entries write "/*(U+...)*/" and get no code point.
static KEYSYM_DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#define\s+XK_([A-Za-z_0-9]+)\s+0x([0-9A-Fa-f]+)\s*(?:/\*\s*U\+([0-9A-Fa-f]+)\s)?")
        .expect("keysym pattern is valid")
});

pub fn read_keysymdef(path: &Path) -> Result<KeysymTable, XkbError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(XkbError::not_found("keysym definitions", path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let table = parse_keysymdef(&text);
    log::debug!("{} keysyms read from {}", table.len(), path.display());
    Ok(table)
}

pub fn parse_keysymdef(text: &str) -> KeysymTable {
    let mut table = KeysymTable::new();

    for line in text.lines() {
        let Some(caps) = KEYSYM_DEFINE.captures(line) else {
            continue;
        };
        let Ok(code) = u32::from_str_radix(&caps[2], 16) else {
            continue;
        };
        let unicode = caps.get(3).and_then(|m| u32::from_str_radix(m.as_str(), 16).ok());
        table.insert(&caps[1], code, unicode);
    }

    table
}

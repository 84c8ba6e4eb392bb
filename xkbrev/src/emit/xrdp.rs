use std::io::Write;
use xkbrev_core::{Key, KeycodeMap, KeysymTable, LayoutModel, ModMask, Modifier, XkbError};

/// XRDP numbers keys the way the xfree86 input driver does
pub const XRDP_KEYCODES: &str = "xfree86";

/// Keymap sections and the modifiers held for each
pub const XRDP_SECTIONS: [(&str, &[Modifier]); 8] = [
    ("noshift", &[]),
    ("shift", &[Modifier::Shift]),
    ("altgr", &[Modifier::LevelThree]),
    ("shiftaltgr", &[Modifier::Shift, Modifier::LevelThree]),
    ("capslock", &[Modifier::Lock]),
    ("capslockaltgr", &[Modifier::Lock, Modifier::LevelThree]),
    ("shiftcapslock", &[Modifier::Shift, Modifier::Lock]),
    ("shiftcapslockaltgr", &[Modifier::Shift, Modifier::Lock, Modifier::LevelThree]),
];

pub struct XrdpWriter<W: Write> {
    writer: W,
}

impl<W: Write> XrdpWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one `[section]` per modifier combination, with a
    /// `Key<scancode>=<keysym>:<unicode>` line per key the layout defines
    pub fn write_keymap(
        mut self,
        model: &LayoutModel,
        keycodes: &KeycodeMap,
        keysyms: &KeysymTable,
    ) -> Result<(), XkbError> {
        let scancodes = keycodes.by_scancode();

        for (index, (section, modifiers)) in XRDP_SECTIONS.iter().enumerate() {
            if index > 0 {
                writeln!(self.writer)?;
            }
            writeln!(self.writer, "[{}]", section)?;

            let active: ModMask = modifiers.iter().copied().collect();
            for (scancode, name) in scancodes.iter().enumerate() {
                let Some(name) = name else {
                    continue;
                };
                let Some(key) = find_key(model, keycodes, name) else {
                    continue;
                };

                let symbol = model.symbol(&key.name, active);
                let (code, unicode) = match symbol.and_then(|s| keysyms.lookup(s)) {
                    Some(info) => (info.code, info.unicode.unwrap_or(0)),
                    None => (0, 0),
                };
                log::debug!(
                    "key = {}, modifier = {}: symbol = {}",
                    name,
                    active,
                    symbol.unwrap_or("NoSymbol")
                );
                writeln!(self.writer, "Key{}={}:{}", scancode, code, unicode)?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// The layout's key for a keycode name, looking through aliases
fn find_key<'m>(model: &'m LayoutModel, keycodes: &KeycodeMap, name: &str) -> Option<&'m Key> {
    model
        .key(name)
        .or_else(|| keycodes.aliases_of(name).find_map(|alias| model.key(alias)))
}

use std::fmt;

/// Modifiers a key type can select levels with.
///
/// Real and virtual modifier names from the Xkb sources are folded onto
/// this set: `Mod1`/`Alt`/`Meta` are all `Alt`, `Mod5`/`LevelThree`/`AltGr`
/// are all `LevelThree`, and so on.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift = 1 << 0,
    Lock = 1 << 1,         // Caps Lock
    Control = 1 << 2,
    Alt = 1 << 3,          // Mod1
    NumLock = 1 << 4,      // Mod2
    LevelFive = 1 << 5,    // Mod3
    Super = 1 << 6,        // Mod4
    LevelThree = 1 << 7,   // Mod5, AltGr
}

impl Modifier {
    pub const ALL: [Modifier; 8] = [
        Modifier::Shift,
        Modifier::Lock,
        Modifier::Control,
        Modifier::Alt,
        Modifier::NumLock,
        Modifier::LevelFive,
        Modifier::Super,
        Modifier::LevelThree,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Shift => "Shift",
            Modifier::Lock => "Lock",
            Modifier::Control => "Control",
            Modifier::Alt => "Alt",
            Modifier::NumLock => "NumLock",
            Modifier::LevelFive => "LevelFive",
            Modifier::Super => "Super",
            Modifier::LevelThree => "LevelThree",
        }
    }

    /// Look up a modifier by any of the names used in the Xkb sources
    pub fn from_name(name: &str) -> Option<Modifier> {
        let modifier = match name.to_ascii_lowercase().as_str() {
            "shift" => Modifier::Shift,
            "lock" => Modifier::Lock,
            "control" => Modifier::Control,
            "mod1" | "alt" | "meta" => Modifier::Alt,
            "mod2" | "numlock" => Modifier::NumLock,
            "mod3" | "levelfive" => Modifier::LevelFive,
            "mod4" | "super" | "hyper" => Modifier::Super,
            "mod5" | "levelthree" | "altgr" => Modifier::LevelThree,
            _ => return None,
        };
        Some(modifier)
    }
}

/// Set of modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ModMask(u16);

impl ModMask {
    pub const NONE: ModMask = ModMask(0);

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier as u16 != 0
    }

    pub fn with(self, modifier: Modifier) -> ModMask {
        ModMask(self.0 | modifier as u16)
    }

    pub fn union(self, other: ModMask) -> ModMask {
        ModMask(self.0 | other.0)
    }

    pub fn intersect(self, other: ModMask) -> ModMask {
        ModMask(self.0 & other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl From<Modifier> for ModMask {
    fn from(modifier: Modifier) -> Self {
        ModMask(modifier as u16)
    }
}

impl FromIterator<Modifier> for ModMask {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        iter.into_iter().fold(ModMask::NONE, ModMask::with)
    }
}

impl fmt::Display for ModMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.iter().map(|m| m.name()).collect();
        f.write_str(&names.join("+"))
    }
}

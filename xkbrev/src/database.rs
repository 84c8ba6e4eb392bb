use crate::parser::SectionKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_XKB_ROOT: &str = "/usr/share/X11/xkb";
pub const DEFAULT_KEYSYMDEF: &str = "/usr/include/X11/keysymdef.h";
pub const DEFAULT_RULES: &str = "base";

/// Where the Xkb database and the keysym header live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePaths {
    pub xkb_root: PathBuf,
    pub keysymdef: PathBuf,
    /// Ruleset name under `rules/`, or a path to a rules file
    pub rules: String,
}

impl Default for DatabasePaths {
    fn default() -> Self {
        Self {
            xkb_root: PathBuf::from(DEFAULT_XKB_ROOT),
            keysymdef: PathBuf::from(DEFAULT_KEYSYMDEF),
            rules: DEFAULT_RULES.to_string(),
        }
    }
}

impl DatabasePaths {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(xkb_root: P, keysymdef: Q) -> Self {
        Self {
            xkb_root: xkb_root.as_ref().to_path_buf(),
            keysymdef: keysymdef.as_ref().to_path_buf(),
            rules: DEFAULT_RULES.to_string(),
        }
    }

    pub fn with_rules(mut self, rules: &str) -> Self {
        self.rules = rules.to_string();
        self
    }

    pub fn component_dir(&self, kind: SectionKind) -> PathBuf {
        self.xkb_root.join(kind.dir())
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.xkb_root.join("rules")
    }

    pub fn rules_file(&self) -> PathBuf {
        if self.rules.contains('/') {
            PathBuf::from(&self.rules)
        } else {
            self.rules_dir().join(&self.rules)
        }
    }

    /// The `.lst` file describing the ruleset's models, layouts and options
    pub fn rules_list_file(&self) -> PathBuf {
        let mut path = self.rules_file().into_os_string();
        path.push(".lst");
        PathBuf::from(path)
    }
}

use super::errors::XkbError;
use std::fmt;
use std::str::FromStr;

/// Output formats selectable with `--generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// INI keymap read by the XRDP server (`km-XXXXXXXX.ini`)
    Xrdp,
    /// Plain listing of the compiled layout
    Dump,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Xrdp, OutputFormat::Dump];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Xrdp => "xrdp",
            OutputFormat::Dump => "dump",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = XkbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|format| format.name() == s)
            .ok_or_else(|| XkbError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

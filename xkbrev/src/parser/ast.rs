// AST nodes for Xkb text sources

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Keycodes,
    Types,
    Compat,
    Symbols,
    Geometry,
}

impl SectionKind {
    pub fn from_keyword(word: &str) -> Option<SectionKind> {
        match word.to_ascii_lowercase().as_str() {
            "xkb_keycodes" => Some(SectionKind::Keycodes),
            "xkb_types" => Some(SectionKind::Types),
            "xkb_compatibility" | "xkb_compatibility_map" | "xkb_compat" => Some(SectionKind::Compat),
            "xkb_symbols" => Some(SectionKind::Symbols),
            "xkb_geometry" => Some(SectionKind::Geometry),
            _ => None,
        }
    }

    /// Directory of the database tree holding this kind of file
    pub fn dir(&self) -> &'static str {
        match self {
            SectionKind::Keycodes => "keycodes",
            SectionKind::Types => "types",
            SectionKind::Compat => "compat",
            SectionKind::Symbols => "symbols",
            SectionKind::Geometry => "geometry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    Default,
    Augment,
    Override,
    Replace,
}

impl MergeMode {
    /// Whether definitions with this mode win over existing ones
    pub fn clobbers(&self) -> bool {
        !matches!(self, MergeMode::Augment)
    }
}

#[derive(Debug)]
pub struct XkbFile {
    pub name: String,
    pub sections: Vec<Section>,
}

impl XkbFile {
    /// Find a section by name, or the default one when `name` is `None`
    pub fn section(&self, kind: SectionKind, name: Option<&str>) -> Option<&Section> {
        let mut candidates = self.sections.iter().filter(|s| s.kind == kind);
        match name {
            Some(name) => candidates.find(|s| s.name == name),
            None => candidates
                .clone()
                .find(|s| s.is_default())
                .or_else(|| candidates.next()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub name: String,
    pub flags: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

impl Section {
    pub fn is_default(&self) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case("default"))
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub merge: MergeMode,
    pub line: usize,
    pub kind: StatementKind,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Include(String),
    Key { name: String, fields: Vec<KeyField> },   // key <AE01> { ... }
    Keycode { name: String, code: i64 },          // <AE01> = 10
    Alias { alias: String, real: String },
    Type { name: String, fields: Vec<VarDef> },
    ModifierMap { modifier: String, keys: Vec<Expr> },
    VirtualModifiers(Vec<String>),
    Var(VarDef),
    Skipped(String),
}

#[derive(Debug, Clone)]
pub enum KeyField {
    Symbols(Vec<Expr>),   // bare [ a, A ]
    Var(VarDef),
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub lhs: LValue,
    pub value: Expr,
}

/// `element.field[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub element: Option<String>,
    pub field: String,
    pub index: Option<Box<Expr>>,
}

impl LValue {
    pub fn is(&self, element: Option<&str>, field: &str) -> bool {
        let element_matches = match (&self.element, element) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        element_matches && self.field.eq_ignore_ascii_case(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Integer(i64),
    Str(String),
    KeyName(String),
    List(Vec<Expr>),
    Field(Box<LValue>),
    Call { name: String, args: Vec<Expr> },
    Sum(Box<Expr>, Box<Expr>),
    Unary(char, Box<Expr>),
    Assign(Box<LValue>, Box<Expr>),
}

impl Expr {
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Keysym name written at this position of a symbols list.
    ///
    /// Single digits name the digit keysyms, larger numbers are raw keysym
    /// values.
    pub fn keysym_name(&self) -> Option<String> {
        match self {
            Expr::Ident(s) => Some(s.clone()),
            Expr::Integer(n) if (0..=9).contains(n) => Some(n.to_string()),
            Expr::Integer(n) => Some(format!("0x{:x}", n)),
            _ => None,
        }
    }

    /// Group or level index such as `Group1`, `Level2` or `2`, one-based
    pub fn ordinal(&self, prefix: &str) -> Option<u32> {
        match self {
            Expr::Integer(n) if *n > 0 => u32::try_from(*n).ok(),
            Expr::Ident(s) => {
                let head = s.get(..prefix.len())?;
                if !head.eq_ignore_ascii_case(prefix) {
                    return None;
                }
                s[prefix.len()..].parse::<u32>().ok().filter(|n| *n > 0)
            }
            _ => None,
        }
    }
}

mod keycodes;
mod symbols;
mod types;

pub use keycodes::{KeycodesCompiler, KeycodesInfo};
pub use symbols::{build_model, KeyInfo, SymbolsCompiler, SymbolsInfo};
pub use types::{TypesCompiler, TypesInfo};

use crate::parser::Expr;
use xkbrev_core::{ModMask, Modifier};

/// Evaluate a modifier expression such as `Shift+LevelThree`.
///
/// `None` when the expression names a modifier outside the known set.
pub(crate) fn mod_mask(expr: &Expr) -> Option<ModMask> {
    match expr {
        Expr::Ident(name) if name.eq_ignore_ascii_case("none") => Some(ModMask::NONE),
        Expr::Ident(name) => Modifier::from_name(name).map(ModMask::from),
        Expr::Integer(0) => Some(ModMask::NONE),
        Expr::Sum(a, b) => Some(mod_mask(a)?.union(mod_mask(b)?)),
        _ => None,
    }
}

/// Like [`mod_mask`], but skips modifiers outside the known set
pub(crate) fn known_mods(expr: &Expr) -> ModMask {
    match expr {
        Expr::Ident(name) => Modifier::from_name(name).map(ModMask::from).unwrap_or_default(),
        Expr::Sum(a, b) => known_mods(a).union(known_mods(b)),
        _ => ModMask::NONE,
    }
}

/// Zero-based level from `Level2`, `2` and the like
pub(crate) fn level_index(expr: &Expr) -> Option<usize> {
    expr.ordinal("Level").map(|level| level as usize - 1)
}

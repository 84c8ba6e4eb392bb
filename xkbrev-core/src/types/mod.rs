pub mod errors;
pub mod format;
pub mod keycodes;
pub mod keysym;
pub mod layout;
pub mod modifier;

pub use errors::*;
pub use format::*;
pub use keycodes::*;
pub use keysym::*;
pub use layout::*;
pub use modifier::*;

pub mod types;

pub use types::*;

// Re-export commonly used types
pub use types::errors::{XkbError, Result};
pub use types::layout::{Key, KeyType, LayoutModel, LayoutRequest};
pub use types::modifier::{Modifier, ModMask};
pub use types::keycodes::KeycodeMap;
pub use types::keysym::{KeysymInfo, KeysymTable};
pub use types::format::OutputFormat;

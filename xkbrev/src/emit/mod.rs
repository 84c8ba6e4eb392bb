mod dump;
mod xrdp;

pub use dump::DumpWriter;
pub use xrdp::{XrdpWriter, XRDP_KEYCODES, XRDP_SECTIONS};

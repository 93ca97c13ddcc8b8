//! Buffers: flat regions, growable TLV builders and nested TLV readers

mod dynbuf;
mod fixed;
mod parse;

pub use crate::buf::dynbuf::*;
pub use crate::buf::fixed::{Detached, FixedBuf};
pub use crate::buf::parse::*;

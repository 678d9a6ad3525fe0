//! Sheet reader port
//!
//! Turns the bytes of a statement file into an untyped grid. One
//! implementation per container format.

use crate::domain::result::Result;
use crate::domain::{FileFormat, RawSheet};

/// Reads raw statement bytes into a `RawSheet`
pub trait SheetReader {
    /// Format this reader understands
    fn format(&self) -> FileFormat;

    /// Parse the bytes. Structural problems are `Error::Format`.
    fn read(&self, bytes: &[u8]) -> Result<RawSheet>;
}

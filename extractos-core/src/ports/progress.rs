//! Progress reporting port
//!
//! The batch processor reports per-file progress through this trait so the
//! CLI can drive a progress bar without the core knowing about terminals.

use crate::domain::Bank;

/// Receives batch progress callbacks. All methods default to no-ops.
pub trait ProgressObserver {
    /// Called before file `index` (0-based) of `total` is processed
    fn file_started(&self, _index: usize, _total: usize, _name: &str, _bank: Bank) {}

    /// Called after file `index` finished, successfully or not
    fn file_finished(&self, _index: usize, _total: usize, _name: &str, _ok: bool) {}

    /// Called once the merge step starts
    fn merging(&self, _tables: usize) {}
}

/// Observer that ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod progress;
mod sheet_reader;

pub use progress::{NoProgress, ProgressObserver};
pub use sheet_reader::SheetReader;

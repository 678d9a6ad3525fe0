//! Core domain entities
//!
//! Banks, statement files and typed tables. Pure data structures with
//! validation logic - no I/O.

pub mod bank;
pub mod result;
mod statement;
mod table;

pub use bank::{fold_label, Bank, FileFormat};
pub use statement::{NormalizedTable, RawCell, RawSheet, RawStatementFile, RowIssue, RowPolicy};
pub use table::{Cell, Column, Table, Value};

//! Statement files as received and as normalized

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bank::{Bank, FileFormat};
use super::result::Error;
use super::table::Table;

/// An uploaded statement: bytes plus what the user declared about them
#[derive(Debug, Clone)]
pub struct RawStatementFile {
    name: String,
    bytes: Vec<u8>,
    bank: Bank,
    format: FileFormat,
}

impl RawStatementFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, bank: Bank, format: FileFormat) -> Self {
        Self {
            name: name.into(),
            bytes,
            bank,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Untyped cell as read from a workbook or delimited file
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl RawCell {
    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text form of the cell
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            RawCell::Date(d) => d.format("%d/%m/%Y").to_string(),
            RawCell::Bool(b) => b.to_string(),
        }
    }
}

/// First worksheet of a workbook, or the records of a delimited file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    /// Build a sheet of text cells; empty strings become `RawCell::Empty`
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|r| {
                r.into_iter()
                    .map(|s| {
                        let s = s.as_ref();
                        if s.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(s.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Cell at (row, col); out of range reads as empty
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map(|r| r.iter().all(RawCell::is_blank))
            .unwrap_or(true)
    }
}

/// What to do with a transaction row whose cells cannot be coerced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Skip the row and list it in the table's dropped rows
    #[default]
    Drop,
    /// Reject the whole file
    Fail,
}

impl FromStr for RowPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(RowPolicy::Drop),
            "fail" => Ok(RowPolicy::Fail),
            other => Err(Error::config(format!(
                "Invalid row policy '{}', expected 'drop' or 'fail'",
                other
            ))),
        }
    }
}

impl fmt::Display for RowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowPolicy::Drop => f.write_str("drop"),
            RowPolicy::Fail => f.write_str("fail"),
        }
    }
}

/// A source row that was left out of a normalized table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based row number in the source file
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// One statement mapped onto its bank's canonical columns
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub bank: Bank,
    pub source: String,
    pub table: Table,
    /// Rows skipped under `RowPolicy::Drop`
    pub dropped: Vec<RowIssue>,
}

impl NormalizedTable {
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_partial(&self) -> bool {
        !self.dropped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cell_text() {
        assert_eq!(RawCell::Number(1500.0).to_text(), "1500");
        assert_eq!(RawCell::Number(-12.5).to_text(), "-12.5");
        assert_eq!(RawCell::Text("  hola ".into()).to_text(), "hola");
        assert!(RawCell::Text("   ".into()).is_blank());
        assert!(!RawCell::Number(0.0).is_blank());
    }

    #[test]
    fn test_sheet_out_of_range_is_empty() {
        let sheet = RawSheet::from_text_rows(vec![vec!["a", ""]]);
        assert_eq!(sheet.cell(0, 0), &RawCell::Text("a".into()));
        assert_eq!(sheet.cell(0, 1), &RawCell::Empty);
        assert_eq!(sheet.cell(5, 5), &RawCell::Empty);
        assert!(sheet.row_is_blank(3));
    }

    #[test]
    fn test_row_policy_parse() {
        assert_eq!("DROP".parse::<RowPolicy>().unwrap(), RowPolicy::Drop);
        assert_eq!("fail".parse::<RowPolicy>().unwrap(), RowPolicy::Fail);
        assert!("skip".parse::<RowPolicy>().is_err());
        assert_eq!(RowPolicy::default(), RowPolicy::Drop);
    }
}

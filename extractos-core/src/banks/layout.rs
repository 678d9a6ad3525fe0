//! Shared layout machinery: header detection, body rows and row collection

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{fold_label, Bank, Cell, Column, RawSheet, RowIssue, RowPolicy, Table, Value};

use super::coerce::detect_currency;

/// Rows searched for the header
pub const HEADER_SEARCH_ROWS: usize = 40;

/// First-cell prefixes that end the transaction block
const FOOTER_PREFIXES: &[&str] = &["total", "saldo final", "cantidad de movimientos", "fin del"];

/// First-cell prefixes of balance carry-over lines, skipped without ending
/// the block
const BALANCE_PREFIXES: &[&str] = &["saldo anterior", "saldo inicial", "saldo al"];

/// Located header row with folded label → column index
#[derive(Debug, Clone)]
pub struct Header {
    pub row: usize,
    labels: HashMap<String, usize>,
}

impl Header {
    /// Column of the first matching alternative
    pub fn find(&self, alternatives: &[&str]) -> Option<usize> {
        alternatives.iter().find_map(|a| self.labels.get(*a).copied())
    }

    /// Like `find`, but a missing column is a format error
    pub fn require(&self, alternatives: &[&str]) -> Result<usize> {
        self.find(alternatives).ok_or_else(|| {
            Error::format(format!("Column '{}' not found in header row", alternatives[0]))
        })
    }
}

/// Find the header row: the first row that contains one alternative of
/// every required label
pub fn find_header(sheet: &RawSheet, required: &[&[&str]]) -> Result<Header> {
    let limit = sheet.rows.len().min(HEADER_SEARCH_ROWS);

    for row in 0..limit {
        let mut labels = HashMap::new();
        for (col, cell) in sheet.rows[row].iter().enumerate() {
            let label = normalize_label(&cell.to_text());
            if !label.is_empty() {
                labels.entry(label).or_insert(col);
            }
        }

        let complete = required
            .iter()
            .all(|alts| alts.iter().any(|a| labels.contains_key(*a)));
        if complete {
            return Ok(Header { row, labels });
        }
    }

    let expected: Vec<&str> = required.iter().map(|alts| alts[0]).collect();
    Err(Error::format(format!(
        "Header row with columns [{}] not found in the first {} rows",
        expected.join(", "),
        HEADER_SEARCH_ROWS
    )))
}

/// Fold a header label and collapse inner whitespace and trailing dots/colons
pub fn normalize_label(text: &str) -> String {
    let folded = fold_label(text);
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches([':', '.']).trim().to_string()
}

/// Row indices of the transaction block below the header
///
/// Blank rows, balance carry-over lines and repeated header rows (page
/// breaks) are skipped; the block ends at the first footer row.
pub fn body_rows(sheet: &RawSheet, header: &Header) -> Vec<usize> {
    let header_first = sheet.rows[header.row]
        .iter()
        .map(|c| normalize_label(&c.to_text()))
        .find(|l| !l.is_empty());

    let mut rows = Vec::new();
    for row in header.row + 1..sheet.rows.len() {
        if sheet.row_is_blank(row) {
            continue;
        }
        let first = sheet.rows[row]
            .iter()
            .map(|c| normalize_label(&c.to_text()))
            .find(|l| !l.is_empty())
            .unwrap_or_default();
        if FOOTER_PREFIXES.iter().any(|p| first.starts_with(p)) {
            break;
        }
        if BALANCE_PREFIXES.iter().any(|p| first.starts_with(p)) {
            continue;
        }
        if Some(&first) == header_first.as_ref() {
            continue;
        }
        rows.push(row);
    }
    rows
}

/// Metadata value above the header: the text after `label:` in the same
/// cell, or the next non-blank cell on the row
pub fn metadata_value(sheet: &RawSheet, header_row: usize, label: &str) -> Option<String> {
    for row in 0..header_row.min(sheet.rows.len()) {
        let cells = &sheet.rows[row];
        for (col, cell) in cells.iter().enumerate() {
            let text = cell.to_text();
            let folded = fold_label(&text);
            if !folded.starts_with(label) {
                continue;
            }
            if let Some((_, value)) = text.split_once(':') {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
            if let Some(next) = cells[col + 1..].iter().find(|c| !c.is_blank()) {
                return Some(next.to_text());
            }
        }
    }
    None
}

/// Currency hints found above the header
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetCurrency {
    /// From a `Moneda` metadata line
    declared: Option<&'static str>,
    /// First currency mentioned anywhere else in the preamble
    preamble: Option<&'static str>,
}

impl SheetCurrency {
    pub fn detect(sheet: &RawSheet, header_row: usize) -> Self {
        let declared = metadata_value(sheet, header_row, "moneda").and_then(|m| detect_currency(&m));
        let preamble = (0..header_row.min(sheet.rows.len()))
            .flat_map(|r| sheet.rows[r].iter())
            .find_map(|c| detect_currency(&c.to_text()));
        Self { declared, preamble }
    }

    /// Currency of one row: the declared currency, else the symbol on the
    /// row's amount cells, else the preamble, else pesos
    pub fn for_row(&self, sheet: &RawSheet, row: usize, amount_cols: &[usize]) -> &'static str {
        self.declared
            .or_else(|| {
                amount_cols
                    .iter()
                    .find_map(|&col| detect_currency(&sheet.cell(row, col).to_text()))
            })
            .or(self.preamble)
            .unwrap_or("ARS")
    }
}

/// Label for a signed amount
pub fn movement_type(amount: Decimal) -> Value {
    if amount.is_sign_negative() && !amount.is_zero() {
        Value::text("Débito")
    } else {
        Value::text("Crédito")
    }
}

/// Optional text cell: blank becomes null
pub fn text_cell(sheet: &RawSheet, row: usize, col: Option<usize>) -> Cell {
    let text = sheet.cell(row, col?).to_text();
    if text.is_empty() {
        None
    } else {
        Some(Value::Text(text))
    }
}

/// A canonical row under construction
#[derive(Debug, Default)]
pub struct CanonicalRow {
    values: HashMap<Column, Value>,
}

impl CanonicalRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: Column, value: impl Into<Option<Value>>) -> &mut Self {
        if let Some(v) = value.into() {
            self.values.insert(column, v);
        }
        self
    }
}

/// Rows extracted by a bank layout
#[derive(Debug)]
pub struct Extracted {
    pub table: Table,
    pub dropped: Vec<RowIssue>,
}

/// Collects canonical rows for one bank and applies the row policy
pub struct RowSink {
    bank: Bank,
    policy: RowPolicy,
    table: Table,
    dropped: Vec<RowIssue>,
}

impl RowSink {
    pub fn new(bank: Bank, policy: RowPolicy) -> Self {
        Self {
            bank,
            policy,
            table: Table::with_columns(bank.columns()),
            dropped: Vec::new(),
        }
    }

    /// Add the outcome of parsing sheet row `row` (0-based)
    pub fn accept(&mut self, row: usize, parsed: std::result::Result<CanonicalRow, String>) -> Result<()> {
        match parsed {
            Ok(mut canonical) => {
                canonical.set(Column::Bank, Value::text(self.bank.display_name()));
                let cells: Vec<Cell> = self
                    .bank
                    .columns()
                    .iter()
                    .map(|c| canonical.values.remove(c))
                    .collect();
                self.table.push_row(cells)
            }
            Err(reason) => {
                let issue = RowIssue { row: row + 1, reason };
                match self.policy {
                    RowPolicy::Drop => {
                        tracing::debug!(bank = %self.bank, row = issue.row, reason = %issue.reason, "dropping row");
                        self.dropped.push(issue);
                        Ok(())
                    }
                    RowPolicy::Fail => Err(Error::format(issue.to_string())),
                }
            }
        }
    }

    pub fn finish(self) -> Extracted {
        Extracted {
            table: self.table,
            dropped: self.dropped,
        }
    }
}

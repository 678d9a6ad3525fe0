//! Merge service - row-wise concatenation of tables with a column union

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::adapters::WorkbookReader;
use crate::domain::result::{Error, Result};
use crate::domain::{Cell, RawCell, RawSheet, Table, Value};
use crate::ports::SheetReader;

/// Concatenate tables in order
///
/// The result has the union of all column names in first-seen order. Cells
/// for columns a source table lacks are null. Rows are neither deduplicated
/// nor sorted. A table naming the same column twice is rejected.
pub fn merge(tables: &[Table]) -> Result<Table> {
    if tables.is_empty() {
        return Err(Error::empty_input("No tables to merge"));
    }

    let mut columns: Vec<String> = Vec::new();
    for (index, table) in tables.iter().enumerate() {
        let mut seen = HashSet::new();
        for name in table.columns() {
            if !seen.insert(name.as_str()) {
                return Err(Error::validation(format!(
                    "Table {} has more than one column named '{}'",
                    index + 1,
                    name
                )));
            }
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    let mut merged = Table::new(columns.iter().cloned());
    for table in tables {
        // Position of each source column in the merged table
        let targets: Vec<usize> = table
            .columns()
            .iter()
            .map(|name| columns.iter().position(|c| c == name).unwrap_or_default())
            .collect();

        for row in table.rows() {
            let mut cells: Vec<Cell> = vec![None; columns.len()];
            for (cell, &target) in row.iter().zip(&targets) {
                cells[target] = cell.clone();
            }
            merged.push_row(cells)?;
        }
    }

    Ok(merged)
}

/// Merges previously exported workbooks
#[derive(Debug, Default)]
pub struct MergeService;

impl MergeService {
    pub fn new() -> Self {
        Self
    }

    /// Merge every `.xlsx` file in `dir`, in file name order
    ///
    /// The first non-blank row of each workbook's first sheet is its header.
    pub fn merge_directory(&self, dir: &Path) -> Result<Table> {
        let files = workbook_files(dir)?;
        if files.is_empty() {
            return Err(Error::empty_input(format!(
                "No .xlsx files found in {}",
                dir.display()
            )));
        }

        let reader = WorkbookReader::new();
        let mut tables = Vec::with_capacity(files.len());
        for path in &files {
            let bytes = std::fs::read(path)?;
            let sheet = reader.read(&bytes).map_err(|e| match e {
                Error::Format(msg) => Error::format(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;
            let table = sheet_to_table(&sheet)?;
            tracing::info!(file = %path.display(), rows = table.row_count(), "read workbook");
            tables.push(table);
        }

        merge(&tables)
    }
}

fn workbook_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        // Skip Excel lock files such as "~$merged.xlsx"
        let is_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("~$"))
            .unwrap_or(false);
        if path.is_file() && is_xlsx && !is_lock {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Typed table from a sheet whose first non-blank row holds the headers
fn sheet_to_table(sheet: &RawSheet) -> Result<Table> {
    let Some(header_row) = (0..sheet.rows.len()).find(|&r| !sheet.row_is_blank(r)) else {
        return Ok(Table::new(Vec::<String>::new()));
    };

    let width = sheet.rows[header_row].len();
    let names = (0..width).map(|c| match sheet.cell(header_row, c).to_text() {
        name if name.is_empty() => format!("Columna {}", c + 1),
        name => name,
    });
    let columns = unique_names(names);

    let mut table = Table::new(columns);
    for row in header_row + 1..sheet.rows.len() {
        if sheet.row_is_blank(row) {
            continue;
        }
        let cells = (0..width).map(|c| typed_cell(sheet.cell(row, c))).collect();
        table.push_row(cells)?;
    }
    Ok(table)
}

/// Suffix repeated header names: `Importe`, `Importe.1`, `Importe.2`
fn unique_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut unique = name.clone();
        let mut n = 1;
        while taken.contains(&unique) {
            unique = format!("{}.{}", name, n);
            n += 1;
        }
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

fn typed_cell(cell: &RawCell) -> Cell {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(s) => Some(Value::Text(s.clone())),
        RawCell::Date(d) => Some(Value::Date(*d)),
        RawCell::Number(n) => match Decimal::from_str(&n.to_string()) {
            Ok(d) => Some(Value::Number(d)),
            Err(_) => Some(Value::Text(n.to_string())),
        },
        RawCell::Bool(b) => Some(Value::Text(b.to_string())),
    }
}

//! Spreadsheet workbook reader backed by calamine

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use zip::ZipArchive;

use crate::domain::result::{Error, Result};
use crate::domain::{FileFormat, RawCell, RawSheet};
use crate::ports::SheetReader;

/// Zip local file header, the start of every xlsx/xlsm/ods file
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE2 compound document header used by legacy .xls files
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Zip entries that identify a spreadsheet package
const WORKBOOK_ENTRIES: &[&str] = &["xl/workbook.xml", "xl/workbook.bin", "content.xml"];

/// Reads the first worksheet of a workbook
#[derive(Debug, Default, Clone)]
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }
}

impl SheetReader for WorkbookReader {
    fn format(&self) -> FileFormat {
        FileFormat::Workbook
    }

    fn read(&self, bytes: &[u8]) -> Result<RawSheet> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::format("Workbook has no worksheets"))??;

        // Pad so sheet row/column indices match the worksheet's A1 coordinates
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![RawCell::Empty; col_offset];
            cells.extend(row.iter().map(convert_cell));
            rows.push(cells);
        }

        Ok(RawSheet::new(rows))
    }
}

fn convert_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                RawCell::Empty
            } else {
                RawCell::Text(s.clone())
            }
        }
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => RawCell::Date(ndt.date()),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d") {
            Ok(d) => RawCell::Date(d),
            Err(_) => RawCell::Text(s.clone()),
        },
        Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) => RawCell::Empty,
    }
}

/// Guess the container format from the leading bytes
///
/// Returns `None` for binary content that is not a spreadsheet (PDFs, other
/// zip packages such as .docx).
pub fn sniff_format(bytes: &[u8]) -> Option<FileFormat> {
    if bytes.starts_with(ZIP_MAGIC) {
        let archive = ZipArchive::new(Cursor::new(bytes)).ok()?;
        let is_workbook = archive
            .file_names()
            .any(|name| WORKBOOK_ENTRIES.contains(&name));
        return is_workbook.then_some(FileFormat::Workbook);
    }
    if bytes.starts_with(OLE2_MAGIC) {
        return Some(FileFormat::Workbook);
    }
    if bytes.iter().take(4096).any(|&b| b == 0) || bytes.starts_with(b"%PDF") {
        return None;
    }
    Some(FileFormat::Delimited)
}

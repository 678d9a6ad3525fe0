//! Delimited text reader (CSV, semicolon and tab separated exports)

use csv::{ReaderBuilder, Trim};

use crate::domain::result::{Error, Result};
use crate::domain::{FileFormat, RawCell, RawSheet};
use crate::ports::SheetReader;

/// Delimiters tried when sniffing, in preference order on ties
const CANDIDATE_DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Lines inspected when sniffing the delimiter
const SNIFF_LINES: usize = 20;

/// Reader for delimited statement exports
///
/// Bank exports come as UTF-8 (sometimes with a BOM) or Latin-1, separated by
/// `;` or `,`. Both are detected unless a delimiter is forced.
#[derive(Debug, Default, Clone)]
pub struct DelimitedReader {
    delimiter: Option<u8>,
}

impl DelimitedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always split on `delimiter` instead of sniffing
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }
}

impl SheetReader for DelimitedReader {
    fn format(&self) -> FileFormat {
        FileFormat::Delimited
    }

    fn read(&self, bytes: &[u8]) -> Result<RawSheet> {
        let text = decode_text(bytes);
        if text.trim().is_empty() {
            return Err(Error::format("File is empty"));
        }

        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&text));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            // Keep sheet rows aligned with source lines when blank lines are skipped
            if let Some(pos) = record.position() {
                while (rows.len() as u64) + 1 < pos.line() {
                    rows.push(Vec::new());
                }
            }
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(RawSheet::new(rows))
    }
}

/// Decode as UTF-8 (dropping a BOM), falling back to Latin-1
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1 maps every byte to the code point of the same value
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Pick the delimiter that splits the first lines most consistently
fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (CANDIDATE_DELIMITERS[0], 0usize, 0usize);
    for &candidate in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| count_unquoted(l, candidate))
            .collect();
        let lines_with = counts.iter().filter(|&&c| c > 0).count();
        let total: usize = counts.iter().sum();
        if (lines_with, total) > (best.1, best.2) {
            best = (candidate, lines_with, total);
        }
    }
    best.0
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

//! Normalize service - one raw statement into its bank's canonical table

use crate::adapters::{reader_for, sniff_format};
use crate::banks;
use crate::domain::result::{Error, Result};
use crate::domain::{NormalizedTable, RawStatementFile, RowPolicy};

/// Map one statement file onto the canonical columns of its declared bank
///
/// Fails with a format error when the file format is not one the bank
/// exports, when the contents do not match the declared format, or when the
/// bank layout cannot be found in the sheet.
pub fn normalize(file: &RawStatementFile, policy: RowPolicy) -> Result<NormalizedTable> {
    let bank = file.bank();
    let declared = file.format();

    if !bank.accepts(declared) {
        let accepted: Vec<String> = bank.accepted_formats().iter().map(|f| f.to_string()).collect();
        return Err(Error::format(format!(
            "{} statements are exported as {}, not {}",
            bank,
            accepted.join(" or "),
            declared
        )));
    }

    match sniff_format(file.bytes()) {
        Some(actual) if actual == declared => {}
        Some(actual) => {
            return Err(Error::format(format!(
                "{} is named as {} but its contents are {}",
                file.name(),
                declared,
                actual
            )))
        }
        None => {
            return Err(Error::format(format!(
                "{} is neither a workbook nor delimited text",
                file.name()
            )))
        }
    }

    let reader = reader_for(declared);
    tracing::debug!(file = file.name(), format = %reader.format(), size = file.size(), "reading statement");
    let sheet = reader.read(file.bytes())?;
    let extracted = banks::extract(bank, &sheet, policy)?;

    tracing::info!(
        file = file.name(),
        bank = %bank,
        rows = extracted.table.row_count(),
        dropped = extracted.dropped.len(),
        "normalized statement"
    );

    Ok(NormalizedTable {
        bank,
        source: file.name().to_string(),
        table: extracted.table,
        dropped: extracted.dropped,
    })
}

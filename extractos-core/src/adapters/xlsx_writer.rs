//! Single-sheet xlsx writer backed by rust_xlsxwriter

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::domain::result::{Error, Result};
use crate::domain::{Table, Value};

/// Excel's day zero for serial dates (1900 date system)
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Excel serial number for a calendar date
pub fn excel_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

/// Calendar date for an Excel serial number
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    excel_epoch().checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

/// Render a table as an xlsx workbook with a bold header row
pub fn write_table(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    fill_sheet(worksheet, table)?;

    Ok(workbook.save_to_buffer()?)
}

fn fill_sheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("dd/mm/yyyy");
    let number = Format::new().set_num_format("#,##0.00");

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, name, &header)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let row_num = u32::try_from(r + 1)
            .map_err(|_| Error::validation("Table has too many rows for a worksheet"))?;
        for (c, cell) in row.iter().enumerate() {
            let col = col_num(c)?;
            match cell {
                None => {}
                Some(Value::Text(s)) | Some(Value::Currency(s)) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Some(Value::Date(d)) => {
                    worksheet.write_number_with_format(row_num, col, excel_serial(*d), &date)?;
                }
                Some(Value::Number(n)) => {
                    let value = n.to_f64().ok_or_else(|| {
                        Error::validation(format!("Amount {} does not fit a worksheet number", n))
                    })?;
                    worksheet.write_number_with_format(row_num, col, value, &number)?;
                }
            }
        }
    }

    // Rough autofit from the header widths
    for (col, name) in table.columns().iter().enumerate() {
        let width = (name.chars().count().max(10) + 2) as f64;
        worksheet.set_column_width(col_num(col)?, width)?;
    }

    Ok(())
}

fn col_num(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::validation("Table has too many columns for a worksheet"))
}

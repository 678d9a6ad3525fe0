//! Banco de la Nación Argentina: Fecha, Comprobante, Concepto, Importe, Saldo

use crate::domain::result::Result;
use crate::domain::{Bank, Column, RawSheet, RowPolicy, Value};

use super::coerce::{parse_amount, parse_date, NumberFormat};
use super::layout::{
    body_rows, find_header, movement_type, text_cell, CanonicalRow, Extracted,
    RowSink, SheetCurrency,
};

const FORMAT: NumberFormat = NumberFormat::DecimalComma;

struct Columns {
    date: usize,
    description: usize,
    reference: Option<usize>,
    amount: usize,
    balance: usize,
}

pub fn extract(sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    let header = find_header(
        sheet,
        &[&["fecha"], &["concepto"], &["importe"], &["saldo"]],
    )?;
    let cols = Columns {
        date: header.require(&["fecha"])?,
        description: header.require(&["concepto"])?,
        reference: header.find(&["comprobante", "nro. comprobante"]),
        amount: header.require(&["importe"])?,
        balance: header.require(&["saldo"])?,
    };
    let currency = SheetCurrency::detect(sheet, header.row);

    let mut sink = RowSink::new(Bank::Nacion, policy);
    for row in body_rows(sheet, &header) {
        sink.accept(row, parse_row(sheet, row, &cols, currency))?;
    }
    Ok(sink.finish())
}

fn parse_row(
    sheet: &RawSheet,
    row: usize,
    cols: &Columns,
    currency: SheetCurrency,
) -> std::result::Result<CanonicalRow, String> {
    let date = parse_date(sheet.cell(row, cols.date))?;
    let amount = parse_amount(sheet.cell(row, cols.amount), FORMAT)?
        .ok_or_else(|| "missing amount".to_string())?;
    let balance = parse_amount(sheet.cell(row, cols.balance), FORMAT)?;

    let currency = currency.for_row(sheet, row, &[cols.amount, cols.balance]);

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, text_cell(sheet, row, Some(cols.description)))
        .set(Column::Reference, text_cell(sheet, row, cols.reference))
        .set(Column::TransactionType, movement_type(amount))
        .set(Column::Amount, Value::Number(amount))
        .set(Column::Balance, balance.map(Value::Number))
        .set(Column::Currency, Value::Currency(currency.to_string()));
    Ok(out)
}

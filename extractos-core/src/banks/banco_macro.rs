//! Banco Macro movements export
//!
//! One signed `Importe` column, split here into debit and credit.

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Bank, Column, RawSheet, RowPolicy, Value};

use super::coerce::{parse_amount, parse_date, NumberFormat};
use super::layout::{body_rows, find_header, text_cell, CanonicalRow, Extracted, RowSink, SheetCurrency};

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
        &[&["fecha"], &["descripcion"], &["importe"], &["saldo"]],
    )?;
    let cols = Columns {
        date: header.require(&["fecha"])?,
        description: header.require(&["descripcion"])?,
        reference: header.find(&["numero de operacion", "nro. de operacion", "nro de operacion"]),
        amount: header.require(&["importe"])?,
        balance: header.require(&["saldo"])?,
    };
    let currency = SheetCurrency::detect(sheet, header.row);

    let mut sink = RowSink::new(Bank::Macro, policy);
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
    let (debit, credit) = split_signed(amount);

    let currency = currency.for_row(sheet, row, &[cols.amount, cols.balance]);

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, text_cell(sheet, row, Some(cols.description)))
        .set(Column::Reference, text_cell(sheet, row, cols.reference))
        .set(Column::Debit, debit.map(Value::Number))
        .set(Column::Credit, credit.map(Value::Number))
        .set(Column::Amount, Value::Number(amount))
        .set(Column::Balance, balance.map(Value::Number))
        .set(Column::Currency, Value::Currency(currency.to_string()));
    Ok(out)
}

/// (debit, credit) as magnitudes; zero counts as a credit
fn split_signed(amount: Decimal) -> (Option<Decimal>, Option<Decimal>) {
    if amount.is_sign_negative() && !amount.is_zero() {
        (Some(amount.abs()), None)
    } else {
        (None, Some(amount))
    }
}

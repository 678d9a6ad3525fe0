//! ICBC "Movimientos" workbook
//!
//! Account metadata sits above the movements table:
//!
//! ```text
//! Cuenta:  | CA $ 0512/01000123/45
//! Moneda:  | Pesos
//!
//! Fecha | Concepto | Débito | Crédito | Saldo
//! ```

use crate::domain::result::Result;
use crate::domain::{Bank, Column, RawSheet, RowPolicy, Value};

use super::coerce::{parse_amount, parse_date, NumberFormat};
use super::layout::{
    body_rows, find_header, metadata_value, text_cell, CanonicalRow, Extracted, RowSink,
    SheetCurrency,
};

const FORMAT: NumberFormat = NumberFormat::DecimalComma;

struct Columns {
    date: usize,
    description: usize,
    debit: usize,
    credit: usize,
    balance: usize,
}

/// Per-sheet values copied onto every row
struct Account {
    number: Option<String>,
    currency: SheetCurrency,
}

pub fn extract(sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    let header = find_header(
        sheet,
        &[&["fecha"], &["concepto"], &["debito"], &["credito"], &["saldo"]],
    )?;
    let cols = Columns {
        date: header.require(&["fecha"])?,
        description: header.require(&["concepto"])?,
        debit: header.require(&["debito"])?,
        credit: header.require(&["credito"])?,
        balance: header.require(&["saldo"])?,
    };
    let account = Account {
        number: metadata_value(sheet, header.row, "cuenta"),
        currency: SheetCurrency::detect(sheet, header.row),
    };
    tracing::debug!(account = ?account.number, currency = ?account.currency, "ICBC account metadata");

    let mut sink = RowSink::new(Bank::Icbc, policy);
    for row in body_rows(sheet, &header) {
        sink.accept(row, parse_row(sheet, row, &cols, &account))?;
    }
    Ok(sink.finish())
}

fn parse_row(
    sheet: &RawSheet,
    row: usize,
    cols: &Columns,
    account: &Account,
) -> std::result::Result<CanonicalRow, String> {
    let date = parse_date(sheet.cell(row, cols.date))?;
    let debit = parse_amount(sheet.cell(row, cols.debit), FORMAT)?.map(|d| d.abs());
    let credit = parse_amount(sheet.cell(row, cols.credit), FORMAT)?.map(|c| c.abs());
    if debit.is_none() && credit.is_none() {
        return Err("no debit or credit amount".to_string());
    }
    let balance = parse_amount(sheet.cell(row, cols.balance), FORMAT)?;

    let currency = account.currency.for_row(sheet, row, &[cols.debit, cols.credit, cols.balance]);

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, text_cell(sheet, row, Some(cols.description)))
        .set(Column::Debit, debit.map(Value::Number))
        .set(Column::Credit, credit.map(Value::Number))
        .set(
            Column::Amount,
            Value::Number(credit.unwrap_or_default() - debit.unwrap_or_default()),
        )
        .set(Column::Balance, balance.map(Value::Number))
        .set(Column::Currency, Value::Currency(currency.to_string()))
        .set(Column::Account, account.number.clone().map(Value::Text));
    Ok(out)
}

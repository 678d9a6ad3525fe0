//! Banco Galicia account movements export
//!
//! ```text
//! Fecha;Descripción;Origen;Débitos;Créditos;Grupo de Conceptos;Concepto;...;Número de Comprobante;...;Tipo de Movimiento;Saldo
//! 02/01/2024;TRANSFERENCIA A TERCEROS;;15.000,00;0,00;...;00012345;...;Transferencia;85.000,00
//! ```
//!
//! Separate debit and credit columns, both positive.

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
    debit: usize,
    credit: usize,
    balance: usize,
    reference: Option<usize>,
    kind: Option<usize>,
}

pub fn extract(sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    let header = find_header(
        sheet,
        &[
            &["fecha"],
            &["descripcion"],
            &["debitos", "debito"],
            &["creditos", "credito"],
            &["saldo"],
        ],
    )?;
    let cols = Columns {
        date: header.require(&["fecha"])?,
        description: header.require(&["descripcion"])?,
        debit: header.require(&["debitos", "debito"])?,
        credit: header.require(&["creditos", "credito"])?,
        balance: header.require(&["saldo"])?,
        reference: header.find(&["numero de comprobante", "comprobante"]),
        kind: header.find(&["tipo de movimiento"]),
    };
    let currency = SheetCurrency::detect(sheet, header.row);

    let mut sink = RowSink::new(Bank::Galicia, policy);
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
    let debit = parse_amount(sheet.cell(row, cols.debit), FORMAT)?.map(|d| d.abs());
    let credit = parse_amount(sheet.cell(row, cols.credit), FORMAT)?.map(|c| c.abs());
    if debit.is_none() && credit.is_none() {
        return Err("no debit or credit amount".to_string());
    }
    let amount = credit.unwrap_or_default() - debit.unwrap_or_default();
    let balance = parse_amount(sheet.cell(row, cols.balance), FORMAT)?;

    let kind = text_cell(sheet, row, cols.kind).unwrap_or_else(|| movement_type(amount));

    let currency = currency.for_row(sheet, row, &[cols.debit, cols.credit, cols.balance]);

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, text_cell(sheet, row, Some(cols.description)))
        .set(Column::Reference, text_cell(sheet, row, cols.reference))
        .set(Column::TransactionType, kind)
        .set(Column::Debit, debit.map(Value::Number))
        .set(Column::Credit, credit.map(Value::Number))
        .set(Column::Amount, Value::Number(amount))
        .set(Column::Balance, balance.map(Value::Number))
        .set(Column::Currency, Value::Currency(currency.to_string()));
    Ok(out)
}

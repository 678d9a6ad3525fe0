//! Banco Supervielle workbook: Fecha, Concepto, Detalle, Débito, Crédito, Saldo

use crate::domain::result::Result;
use crate::domain::{Bank, Column, RawSheet, RowPolicy, Value};

use super::coerce::{parse_amount, parse_date, NumberFormat};
use super::layout::{body_rows, find_header, CanonicalRow, Extracted, RowSink, SheetCurrency};

const FORMAT: NumberFormat = NumberFormat::DecimalComma;

struct Columns {
    date: usize,
    concept: usize,
    detail: Option<usize>,
    debit: usize,
    credit: usize,
    balance: usize,
}

pub fn extract(sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    let header = find_header(
        sheet,
        &[
            &["fecha"],
            &["concepto"],
            &["debito", "debitos"],
            &["credito", "creditos"],
            &["saldo"],
        ],
    )?;
    let cols = Columns {
        date: header.require(&["fecha"])?,
        concept: header.require(&["concepto"])?,
        detail: header.find(&["detalle"]),
        debit: header.require(&["debito", "debitos"])?,
        credit: header.require(&["credito", "creditos"])?,
        balance: header.require(&["saldo"])?,
    };
    let currency = SheetCurrency::detect(sheet, header.row);

    let mut sink = RowSink::new(Bank::Supervielle, policy);
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
    let balance = parse_amount(sheet.cell(row, cols.balance), FORMAT)?;

    let currency = currency.for_row(sheet, row, &[cols.debit, cols.credit, cols.balance]);

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, description(sheet, row, cols))
        .set(Column::Debit, debit.map(Value::Number))
        .set(Column::Credit, credit.map(Value::Number))
        .set(
            Column::Amount,
            Value::Number(credit.unwrap_or_default() - debit.unwrap_or_default()),
        )
        .set(Column::Balance, balance.map(Value::Number))
        .set(Column::Currency, Value::Currency(currency.to_string()));
    Ok(out)
}

/// `Concepto - Detalle`, or whichever of the two is present
fn description(sheet: &RawSheet, row: usize, cols: &Columns) -> Option<Value> {
    let concept = sheet.cell(row, cols.concept).to_text();
    let detail = cols
        .detail
        .map(|c| sheet.cell(row, c).to_text())
        .unwrap_or_default();

    let joined = match (concept.is_empty(), detail.is_empty()) {
        (true, true) => return None,
        (false, true) => concept,
        (true, false) => detail,
        (false, false) => format!("{} - {}", concept, detail),
    };
    Some(Value::Text(joined))
}

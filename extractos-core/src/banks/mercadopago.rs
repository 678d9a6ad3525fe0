//! MercadoPago account statement
//!
//! A summary block precedes the movements:
//!
//! ```text
//! INITIAL_BALANCE;CREDITS;DEBITS;FINAL_BALANCE
//! 1.000,00;5.000,00;-2.000,00;4.000,00
//!
//! RELEASE_DATE;TRANSACTION_TYPE;REFERENCE_ID;TRANSACTION_NET_AMOUNT;PARTIAL_BALANCE
//! 01-02-2024;Transferencia recibida Juan Perez;70012345678;5.000,00;6.000,00
//! ```

use crate::domain::result::Result;
use crate::domain::{Bank, Column, RawSheet, RowPolicy, Value};

use super::coerce::{parse_amount, parse_date, NumberFormat};
use super::layout::{body_rows, find_header, movement_type, text_cell, CanonicalRow, Extracted, RowSink};

const FORMAT: NumberFormat = NumberFormat::DecimalComma;

struct Columns {
    date: usize,
    description: usize,
    reference: usize,
    amount: usize,
    balance: usize,
}

pub fn extract(sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    let header = find_header(
        sheet,
        &[
            &["release_date"],
            &["transaction_type"],
            &["reference_id"],
            &["transaction_net_amount"],
            &["partial_balance"],
        ],
    )?;
    let cols = Columns {
        date: header.require(&["release_date"])?,
        description: header.require(&["transaction_type"])?,
        reference: header.require(&["reference_id"])?,
        amount: header.require(&["transaction_net_amount"])?,
        balance: header.require(&["partial_balance"])?,
    };

    let mut sink = RowSink::new(Bank::MercadoPago, policy);
    for row in body_rows(sheet, &header) {
        sink.accept(row, parse_row(sheet, row, &cols))?;
    }
    Ok(sink.finish())
}

fn parse_row(sheet: &RawSheet, row: usize, cols: &Columns) -> std::result::Result<CanonicalRow, String> {
    let date = parse_date(sheet.cell(row, cols.date))?;
    let amount = parse_amount(sheet.cell(row, cols.amount), FORMAT)?
        .ok_or_else(|| "missing amount".to_string())?;
    let balance = parse_amount(sheet.cell(row, cols.balance), FORMAT)?;

    let mut out = CanonicalRow::new();
    out.set(Column::Date, Value::Date(date))
        .set(Column::Description, text_cell(sheet, row, Some(cols.description)))
        .set(Column::Reference, text_cell(sheet, row, Some(cols.reference)))
        .set(Column::TransactionType, movement_type(amount))
        .set(Column::Amount, Value::Number(amount))
        .set(Column::Balance, balance.map(Value::Number))
        // Argentine accounts are always held in pesos
        .set(Column::Currency, Value::Currency("ARS".to_string()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DelimitedReader;
    use crate::ports::SheetReader;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "\
INITIAL_BALANCE;CREDITS;DEBITS;FINAL_BALANCE
1.000,00;5.000,00;-2.000,00;4.000,00

RELEASE_DATE;TRANSACTION_TYPE;REFERENCE_ID;TRANSACTION_NET_AMOUNT;PARTIAL_BALANCE
01-02-2024;Transferencia recibida Juan Perez;70012345678;5.000,00;6.000,00
03-02-2024;Pago con QR Kiosco;70012345679;-2.000,00;4.000,00
04-02-2024;Rendimientos;70012345680;;4.000,00
";

    #[test]
    fn test_mercadopago_skips_summary_block() {
        let sheet = DelimitedReader::new().read(SAMPLE.as_bytes()).unwrap();
        let out = extract(&sheet, RowPolicy::Drop).unwrap();
        let t = &out.table;

        assert_eq!(t.row_count(), 2);
        assert_eq!(t.get(0, "Descripción").and_then(|v| v.as_str()), Some("Transferencia recibida Juan Perez"));
        assert_eq!(t.get(0, "Referencia").and_then(|v| v.as_str()), Some("70012345678"));
        assert_eq!(t.get(0, "Tipo de movimiento").and_then(|v| v.as_str()), Some("Crédito"));
        assert_eq!(t.get(1, "Importe").and_then(Value::as_number), Some(Decimal::new(-2000, 0)));
        assert_eq!(t.get(1, "Tipo de movimiento").and_then(|v| v.as_str()), Some("Débito"));
        assert_eq!(t.get(1, "Banco").and_then(|v| v.as_str()), Some("MercadoPago"));

        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].row, 7);
        assert_eq!(out.dropped[0].reason, "missing amount");
    }

    #[test]
    fn test_mercadopago_fail_policy() {
        let sheet = DelimitedReader::new().read(SAMPLE.as_bytes()).unwrap();
        let err = extract(&sheet, RowPolicy::Fail).unwrap_err();
        assert_eq!(err.kind(), "FormatError");
        assert!(err.to_string().contains("row 7"));
    }

    #[test]
    fn test_mercadopago_opening_balance_is_skipped() {
        let data = "\
RELEASE_DATE;TRANSACTION_TYPE;REFERENCE_ID;TRANSACTION_NET_AMOUNT;PARTIAL_BALANCE
;Saldo inicial;;;1.000,00
01-02-2024;Pago con QR;70012345679;-200,00;800,00
";
        let sheet = DelimitedReader::new().read(data.as_bytes()).unwrap();
        let out = extract(&sheet, RowPolicy::Fail).unwrap();
        assert_eq!(out.table.row_count(), 1);
    }
}

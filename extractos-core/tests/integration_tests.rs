//! Integration tests for extractos-core services
//!
//! These tests run whole batches over real files in temporary directories:
//! upload, normalization for every bank, merge, and workbook export.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::TempDir;

use extractos_core::adapters::{excel_serial, WorkbookReader};
use extractos_core::config::Config;
use extractos_core::domain::RawCell;
use extractos_core::ports::{NoProgress, ProgressObserver, SheetReader};
use extractos_core::services::{
    merge, normalize, ExportService, FileStatus, MergeService, ProcessService, RetryPolicy,
    UploadService, NOTHING_PROCESSED,
};
use extractos_core::{Bank, ExtractosContext, FileFormat, RawStatementFile, RowPolicy, Table, Value};

// ============================================================================
// Test Helpers
// ============================================================================

const GALICIA_CSV: &str = "\
Fecha;Descripción;Origen;Débitos;Créditos;Número de Comprobante;Tipo de Movimiento;Saldo
02/01/2024;TRANSFERENCIA A TERCEROS;Home Banking;15.000,00;0,00;00012345;Transferencia;85.000,00
03/01/2024;ACREDITACION HABERES;;;350.000,50;00012346;;435.000,50
05/01/2024;PAGO TARJETA;;20.000,00;;00012347;;415.000,50
";

const MERCADOPAGO_CSV: &str = "\
INITIAL_BALANCE;CREDITS;DEBITS;FINAL_BALANCE
1.000,00;5.000,00;-2.000,00;4.000,00

RELEASE_DATE;TRANSACTION_TYPE;REFERENCE_ID;TRANSACTION_NET_AMOUNT;PARTIAL_BALANCE
01-02-2024;Transferencia recibida;70012345678;5.000,00;6.000,00
03-02-2024;Pago con QR;70012345679;-2.000,00;4.000,00
";

const MACRO_CSV: &str = "\
Fecha,Número de Operación,Descripción,Importe,Saldo
15/05/2024,881234,DEB. AUT. SEGURO,\"-3.200,00\",\"46.800,00\"
16/05/2024,881235,TRANSF. RECIBIDA,\"10.000,00\",\"56.800,00\"
17/05/2024,881236,COMISION,\"-150,00\",\"56.650,00\"
Total,,,,
";

const NACION_CSV: &str = "\
Fecha;Comprobante;Concepto;Importe;Saldo
20/06/2024;0001;PAGO SERVICIOS;-8.750,00;91.250,00
21/06/2024;0002;DEPOSITO EFECTIVO;12.000,00;103.250,00
22/06/2024;0003;AJUSTE;abc;103.250,00
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// ICBC workbook with account metadata and native date cells
fn icbc_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    sheet.write_string(0, 0, "Cuenta:").unwrap();
    sheet.write_string(0, 1, "CA $ 0512/01000123/45").unwrap();
    sheet.write_string(1, 0, "Moneda:").unwrap();
    sheet.write_string(1, 1, "Pesos").unwrap();
    for (col, name) in ["Fecha", "Concepto", "Débito", "Crédito", "Saldo"].iter().enumerate() {
        sheet.write_string(3, col as u16, *name).unwrap();
    }
    sheet
        .write_number_with_format(4, 0, excel_serial(date(2024, 3, 1)), &date_format)
        .unwrap();
    sheet.write_string(4, 1, "CREDITO TRANSFERENCIA").unwrap();
    sheet.write_number(4, 3, 1200.0).unwrap();
    sheet.write_number(4, 4, 1500.0).unwrap();
    sheet
        .write_number_with_format(5, 0, excel_serial(date(2024, 3, 2)), &date_format)
        .unwrap();
    sheet.write_string(5, 1, "COMISION MANTENIMIENTO").unwrap();
    sheet.write_number(5, 2, 12.5).unwrap();
    sheet.write_number(5, 4, 1487.5).unwrap();
    sheet.write_string(6, 0, "Saldo final").unwrap();
    sheet.write_number(6, 4, 1487.5).unwrap();

    workbook.save_to_buffer().unwrap()
}

/// Supervielle workbook with text cells, as exported by home banking
fn supervielle_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let rows = [
        ["Fecha", "Concepto", "Detalle", "Débito", "Crédito", "Saldo"],
        ["10/04/2024", "Compra con tarjeta", "SUPERMERCADO DIA", "4.530,10", "", "95.469,90"],
        ["11/04/2024", "Transferencia recibida", "", "", "20.000,00", "115.469,90"],
    ];
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn process_service(dir: &Path, max_file_size: u64, policy: RowPolicy) -> ProcessService {
    let upload = UploadService::new(max_file_size, RetryPolicy::new(2, Duration::from_millis(1)));
    ProcessService::new(upload, policy, Some(dir.join("staging")))
}

fn staging_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir.join("staging"))
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

fn headers(bank: Bank) -> Vec<&'static str> {
    bank.columns().iter().map(|c| c.header()).collect()
}

// ============================================================================
// Per-Bank Normalization Tests
// ============================================================================

/// Every bank's sample yields exactly its canonical columns and one row per movement
#[test]
fn test_every_bank_sample_normalizes() {
    let samples: Vec<(Bank, &str, Vec<u8>, usize)> = vec![
        (Bank::Galicia, "galicia.csv", GALICIA_CSV.as_bytes().to_vec(), 3),
        (Bank::MercadoPago, "mp.csv", MERCADOPAGO_CSV.as_bytes().to_vec(), 2),
        (Bank::Icbc, "icbc.xlsx", icbc_xlsx(), 2),
        (Bank::Supervielle, "supervielle.xlsx", supervielle_xlsx(), 2),
        (Bank::Macro, "macro.csv", MACRO_CSV.as_bytes().to_vec(), 3),
        (Bank::Nacion, "nacion.csv", NACION_CSV.as_bytes().to_vec(), 2),
    ];

    for (bank, name, bytes, expected_rows) in samples {
        let format = FileFormat::from_path(Path::new(name)).unwrap();
        let file = RawStatementFile::new(name, bytes, bank, format);
        let table = normalize(&file, RowPolicy::Drop)
            .unwrap_or_else(|e| panic!("{} failed: {}", bank, e));

        assert_eq!(table.table.columns(), headers(bank).as_slice(), "{}", bank);
        assert_eq!(table.row_count(), expected_rows, "{}", bank);
        for row in 0..table.row_count() {
            assert_eq!(
                table.table.get(row, "Banco").and_then(|v| v.as_str()),
                Some(bank.display_name())
            );
        }
    }
}

#[test]
fn test_icbc_workbook_dates_and_account() {
    let file = RawStatementFile::new("icbc.xlsx", icbc_xlsx(), Bank::Icbc, FileFormat::Workbook);
    let table = normalize(&file, RowPolicy::Fail).unwrap();

    assert_eq!(
        table.table.get(0, "Fecha").and_then(Value::as_date),
        Some(date(2024, 3, 1))
    );
    assert_eq!(
        table.table.get(1, "Importe").and_then(Value::as_number),
        Some(Decimal::new(-125, 1))
    );
    assert_eq!(
        table.table.get(1, "Cuenta").and_then(|v| v.as_str()),
        Some("CA $ 0512/01000123/45")
    );
    assert_eq!(table.table.get(1, "Moneda").and_then(|v| v.as_str()), Some("ARS"));
}

#[test]
fn test_workbook_only_bank_rejects_csv() {
    let file = RawStatementFile::new(
        "icbc.csv",
        NACION_CSV.as_bytes().to_vec(),
        Bank::Icbc,
        FileFormat::Delimited,
    );
    let err = normalize(&file, RowPolicy::Drop).unwrap_err();
    assert_eq!(err.kind(), "FormatError");
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_example_from_two_sources() {
    let amount = |n| Some(Value::Number(Decimal::new(n, 0)));
    let d = Some(Value::Date(date(2024, 1, 1)));

    let mut a = Table::new(["date", "amount"]);
    a.push_row(vec![d.clone(), amount(10)]).unwrap();
    a.push_row(vec![d.clone(), amount(-5)]).unwrap();
    let mut b = Table::new(["date", "amount", "account"]);
    b.push_row(vec![d.clone(), amount(7), Some(Value::text("CA 99"))]).unwrap();

    let merged = merge(&[a, b]).unwrap();

    assert_eq!(merged.columns(), &["date", "amount", "account"]);
    assert_eq!(merged.row_count(), 3);
    assert!(merged.get(0, "account").is_none());
    assert!(merged.get(1, "account").is_none());
    assert_eq!(merged.get(2, "account").and_then(|v| v.as_str()), Some("CA 99"));
}

/// Row count is the sum of inputs, columns are the union, order is kept
#[test]
fn test_merge_normalized_banks() {
    let galicia = RawStatementFile::new(
        "galicia.csv",
        GALICIA_CSV.as_bytes().to_vec(),
        Bank::Galicia,
        FileFormat::Delimited,
    );
    let icbc = RawStatementFile::new("icbc.xlsx", icbc_xlsx(), Bank::Icbc, FileFormat::Workbook);
    let g = normalize(&galicia, RowPolicy::Drop).unwrap();
    let i = normalize(&icbc, RowPolicy::Drop).unwrap();

    let merged = merge(&[g.table.clone(), i.table.clone()]).unwrap();

    assert_eq!(merged.row_count(), g.row_count() + i.row_count());
    let mut expected: Vec<&str> = headers(Bank::Galicia);
    expected.push("Cuenta");
    assert_eq!(merged.columns(), expected.as_slice());

    let banks: Vec<_> = merged
        .column_values("Banco")
        .unwrap()
        .map(|c| c.as_ref().and_then(|v| v.as_str()).unwrap_or_default().to_string())
        .collect();
    assert_eq!(banks, vec!["Galicia", "Galicia", "Galicia", "ICBC", "ICBC"]);
    // Galicia rows have no account, ICBC rows have no reference
    assert!(merged.get(0, "Cuenta").is_none());
    assert!(merged.get(3, "Referencia").is_none());
}

// ============================================================================
// Batch Processing Tests
// ============================================================================

#[test]
fn test_batch_with_format_error_still_merges_others() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let files = vec![
        write_file(dir, "galicia.csv", GALICIA_CSV.as_bytes()),
        // Nación contents declared as MercadoPago
        write_file(dir, "wrong.csv", NACION_CSV.as_bytes()),
        write_file(dir, "supervielle.xlsx", &supervielle_xlsx()),
    ];
    let banks = vec![Bank::Galicia, Bank::MercadoPago, Bank::Supervielle];

    let report = process_service(dir, 1024 * 1024, RowPolicy::Drop)
        .process(&files, &banks, &NoProgress)
        .unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(report.failed(), 1);
    match &report.files[1].status {
        FileStatus::Failed { kind, .. } => assert_eq!(kind, "FormatError"),
        other => panic!("unexpected status {:?}", other),
    }
    let table = report.table.as_ref().unwrap();
    assert_eq!(table.row_count(), 5);
    assert_eq!(report.total_rows, 5);
    assert!(report.warnings.is_empty());
    assert!(staging_is_empty(dir));
}

#[test]
fn test_file_over_size_cap_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let small = write_file(dir, "nacion.csv", NACION_CSV.as_bytes());
    let mut big_contents = GALICIA_CSV.as_bytes().to_vec();
    big_contents.extend(std::iter::repeat(b'\n').take(NACION_CSV.len()));
    let big = write_file(dir, "galicia.csv", &big_contents);

    let cap = NACION_CSV.len() as u64;
    let report = process_service(dir, cap, RowPolicy::Drop)
        .process(&[big, small], &[Bank::Galicia, Bank::Nacion], &NoProgress)
        .unwrap();

    match &report.files[0].status {
        FileStatus::Skipped { kind, .. } => assert_eq!(kind, "SizeLimitExceeded"),
        other => panic!("unexpected status {:?}", other),
    }
    let table = report.table.as_ref().unwrap();
    assert_eq!(table.row_count(), 2);
    assert!(table
        .column_values("Banco")
        .unwrap()
        .all(|c| c.as_ref().and_then(|v| v.as_str()) == Some("Nación")));
}

#[test]
fn test_row_policies_in_batch() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let files = vec![
        write_file(dir, "nacion.csv", NACION_CSV.as_bytes()),
        write_file(dir, "macro.csv", MACRO_CSV.as_bytes()),
    ];
    let banks = vec![Bank::Nacion, Bank::Macro];

    let dropped = process_service(dir, 1024 * 1024, RowPolicy::Drop)
        .process(&files, &banks, &NoProgress)
        .unwrap();
    match &dropped.files[0].status {
        FileStatus::Processed { rows, dropped } => {
            assert_eq!(*rows, 2);
            assert_eq!(dropped.len(), 1);
            assert_eq!(dropped[0].row, 4);
        }
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(dropped.total_rows, 5);

    let failed = process_service(dir, 1024 * 1024, RowPolicy::Fail)
        .process(&files, &banks, &NoProgress)
        .unwrap();
    match &failed.files[0].status {
        FileStatus::Failed { kind, message } => {
            assert_eq!(kind, "FormatError");
            assert!(message.contains("row 4"));
        }
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(failed.total_rows, 3);
}

#[test]
fn test_all_files_failing_warns_and_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let files = vec![
        write_file(dir, "a.csv", b"nothing useful here\n"),
        dir.join("missing.xlsx"),
    ];

    let report = process_service(dir, 1024, RowPolicy::Drop)
        .process(&files, &[Bank::Galicia, Bank::Icbc], &NoProgress)
        .unwrap();

    assert!(report.table.is_none());
    assert_eq!(report.processed(), 0);
    assert_eq!(report.warnings, vec![NOTHING_PROCESSED.to_string()]);
    assert!(report.columns.is_empty());
    assert!(staging_is_empty(dir));
}

#[test]
fn test_progress_callbacks() {
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ProgressObserver for Recorder {
        fn file_started(&self, index: usize, total: usize, name: &str, _bank: Bank) {
            self.events.borrow_mut().push(format!("start {}/{} {}", index, total, name));
        }
        fn file_finished(&self, index: usize, _total: usize, _name: &str, ok: bool) {
            self.events.borrow_mut().push(format!("done {} {}", index, ok));
        }
        fn merging(&self, tables: usize) {
            self.events.borrow_mut().push(format!("merge {}", tables));
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let files = vec![
        write_file(dir, "nacion.csv", NACION_CSV.as_bytes()),
        write_file(dir, "bad.csv", b"x"),
    ];
    let recorder = Recorder::default();
    process_service(dir, 1024, RowPolicy::Drop)
        .process(&files, &[Bank::Nacion, Bank::Nacion], &recorder)
        .unwrap();

    assert_eq!(
        recorder.events.into_inner(),
        vec![
            "start 0/2 nacion.csv",
            "done 0 true",
            "start 1/2 bad.csv",
            "done 1 false",
            "merge 1",
        ]
    );
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_exported_workbook_reads_back() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let files = vec![
        write_file(dir, "mp.csv", MERCADOPAGO_CSV.as_bytes()),
        write_file(dir, "icbc.xlsx", &icbc_xlsx()),
    ];
    let report = process_service(dir, 1024 * 1024, RowPolicy::Drop)
        .process(&files, &[Bank::MercadoPago, Bank::Icbc], &NoProgress)
        .unwrap();
    let table = report.table.unwrap();

    let path = ExportService::default().write(&table, dir).unwrap();
    assert!(path.ends_with("estados_de_cuenta_fusionados.xlsx"));

    let sheet = WorkbookReader::new().read(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(sheet.rows.len(), table.row_count() + 1);
    for (col, name) in table.columns().iter().enumerate() {
        assert_eq!(sheet.cell(0, col), &RawCell::Text(name.clone()));
    }
    // Dates come back as dates, amounts as numbers
    let fecha = table.column_index("Fecha").unwrap();
    let importe = table.column_index("Importe").unwrap();
    assert_eq!(sheet.cell(1, fecha), &RawCell::Date(date(2024, 2, 1)));
    assert_eq!(sheet.cell(2, importe), &RawCell::Number(-2000.0));
}

#[test]
fn test_merge_directory_of_exports() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let export = ExportService::default();

    let mut first = Table::new(["Fecha", "Importe"]);
    first
        .push_row(vec![
            Some(Value::Date(date(2024, 1, 2))),
            Some(Value::Number(Decimal::new(100, 0))),
        ])
        .unwrap();
    let mut second = Table::new(["Fecha", "Importe", "Cuenta"]);
    second
        .push_row(vec![
            Some(Value::Date(date(2024, 1, 3))),
            Some(Value::Number(Decimal::new(-50, 0))),
            Some(Value::text("CA 1")),
        ])
        .unwrap();
    second.push_row(vec![None, None, Some(Value::text("CA 2"))]).unwrap();

    export.write(&second, &dir.join("b.xlsx")).unwrap();
    export.write(&first, &dir.join("a.xlsx")).unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let merged = MergeService::new().merge_directory(dir).unwrap();

    assert_eq!(merged.columns(), &["Fecha", "Importe", "Cuenta"]);
    assert_eq!(merged.row_count(), 3);
    // a.xlsx sorts first
    assert_eq!(merged.get(0, "Importe").and_then(Value::as_number), Some(Decimal::new(100, 0)));
    assert_eq!(merged.get(0, "Fecha").and_then(Value::as_date), Some(date(2024, 1, 2)));
    assert!(merged.get(0, "Cuenta").is_none());
    assert_eq!(merged.get(2, "Cuenta").and_then(|v| v.as_str()), Some("CA 2"));
}

// ============================================================================
// Context Tests
// ============================================================================

#[test]
fn test_context_uses_saved_settings() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.set("rowPolicy", "fail").unwrap();
    config.set("output.sheetName", "Enero").unwrap();
    config.save(temp_dir.path()).unwrap();

    let ctx = ExtractosContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.process_service.policy(), RowPolicy::Fail);
    assert_eq!(ctx.export_service.sheet_name(), "Enero");
    assert_eq!(ctx.upload_service.max_file_size(), 200 * 1024 * 1024);
}

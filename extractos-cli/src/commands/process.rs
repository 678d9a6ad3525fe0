//! Process command - normalize statements and write the merged workbook

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use extractos_core::ports::ProgressObserver;
use extractos_core::services::{BatchReport, FileStatus, LogEvent};
use extractos_core::Bank;

use super::{get_context, log_event, parse_bank, resolve_policy};
use crate::output;

/// Progress bar over the files of a batch
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl ProgressObserver for BarProgress {
    fn file_started(&self, _index: usize, _total: usize, name: &str, bank: Bank) {
        self.bar.set_message(format!("{} ({})", name, bank));
    }

    fn file_finished(&self, _index: usize, _total: usize, _name: &str, _ok: bool) {
        self.bar.inc(1);
    }

    fn merging(&self, tables: usize) {
        self.bar.set_message(format!("merging {} tables", tables));
    }
}

#[derive(Serialize)]
struct ProcessOutput<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    output: Option<PathBuf>,
}

pub fn run(
    files: Vec<PathBuf>,
    bank_args: Vec<String>,
    output_path: Option<PathBuf>,
    row_policy: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let policy = resolve_policy(row_policy, ctx.config.row_policy)?;

    let banks = if bank_args.is_empty() && !json && atty::is(atty::Stream::Stdin) {
        ask_banks(&files)?
    } else {
        bank_args
            .iter()
            .map(|b| parse_bank(b))
            .collect::<Result<Vec<_>>>()?
    };

    let progress = BarProgress::new(files.len(), !json && atty::is(atty::Stream::Stderr));
    let service = ctx.process_service.clone().with_policy(policy);
    let report = service.process(&files, &banks, &progress)?;
    progress.bar.finish_and_clear();

    let written = match &report.table {
        Some(table) => {
            let target = output_path.unwrap_or_else(|| PathBuf::from(ctx.export_service.file_name()));
            let path = ctx
                .export_service
                .write(table, &target)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            Some(path)
        }
        None => None,
    };

    log_event(
        LogEvent::new("process_finished")
            .with_command("process")
            .with_error_details(format!(
                "{} processed, {} failed",
                report.processed(),
                report.failed()
            )),
    );

    if json {
        let out = ProcessOutput {
            report: &report,
            output: written,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_report(&report);
    if let Some(path) = written {
        println!();
        output::success(&format!(
            "✓ {} rows from {} files written to {}",
            report.total_rows,
            report.processed(),
            path.display()
        ));
    }
    Ok(())
}

/// Ask for the bank of every file
fn ask_banks(files: &[PathBuf]) -> Result<Vec<Bank>> {
    let names: Vec<&str> = Bank::ALL.iter().map(|b| b.display_name()).collect();
    let mut banks = Vec::with_capacity(files.len());
    for file in files {
        let choice = Select::new()
            .with_prompt(format!("Bank for {}", file_label(file)))
            .items(&names)
            .default(0)
            .interact()?;
        banks.push(Bank::ALL[choice]);
    }
    Ok(banks)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &BatchReport) {
    let mut table = output::create_table();
    table.set_header(vec!["File", "Bank", "Status", "Rows", "Details"]);

    for file in &report.files {
        let (status, details) = output::status_label(&file.status);
        let rows = match &file.status {
            FileStatus::Processed { rows, .. } => *rows,
            _ => 0,
        };
        table.add_row(vec![
            file.file.clone(),
            file.bank.to_string(),
            status,
            rows.to_string(),
            details,
        ]);
    }
    println!("{}", table);

    for file in &report.files {
        if let FileStatus::Processed { dropped, .. } = &file.status {
            for issue in dropped {
                println!("  {} {}: {}", "•".dimmed(), file.file, issue.to_string().dimmed());
            }
        }
    }

    for warning in &report.warnings {
        output::warning(&format!("⚠ {}", warning));
    }
}

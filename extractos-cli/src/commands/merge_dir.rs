//! Merge-dir command - merge previously exported workbooks

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use extractos_core::services::LogEvent;

use super::{get_context, log_event};
use crate::output;

#[derive(Serialize)]
struct MergeOutput {
    output: PathBuf,
    columns: Vec<String>,
    rows: usize,
}

pub fn run(dir: &Path, output_path: Option<PathBuf>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let table = ctx
        .merge_service
        .merge_directory(dir)
        .with_context(|| format!("Failed to merge workbooks in {}", dir.display()))?;

    let target = output_path.unwrap_or_else(|| PathBuf::from(ctx.export_service.file_name()));
    let written = ctx.export_service.write(&table, &target)?;

    log_event(LogEvent::new("merge_dir").with_command("merge-dir"));

    if json {
        let out = MergeOutput {
            output: written,
            columns: table.columns().to_vec(),
            rows: table.row_count(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    output::success(&format!(
        "✓ {} rows, {} columns written to {}",
        table.row_count(),
        table.columns().len(),
        written.display()
    ));
    Ok(())
}

//! Preview command - normalize one statement without writing anything

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use extractos_core::services::{normalize, LogEvent, StagingArea, UploadService};
use extractos_core::{Bank, NormalizedTable, RowPolicy};

use super::{get_context, log_event, parse_bank, resolve_policy};
use crate::output;

pub fn run(file: &Path, bank: &str, limit: usize, row_policy: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let bank = parse_bank(bank)?;
    let policy = resolve_policy(row_policy, ctx.config.row_policy)?;

    let (result, warnings) = load_statement(
        &ctx.upload_service,
        ctx.config.staging_dir.as_deref(),
        file,
        bank,
        policy,
    );
    for warning in &warnings {
        log_event(
            LogEvent::new("staging_failed")
                .with_command("preview")
                .with_bank(bank)
                .with_error(warning.clone()),
        );
    }
    let normalized = result?;

    log_event(
        LogEvent::new("preview")
            .with_command("preview")
            .with_bank(bank)
            .with_file(normalized.source.clone()),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&normalized.table)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows)",
        normalized.source.bold(),
        format!("[{}]", normalized.bank).dimmed(),
        normalized.row_count()
    );
    println!();

    let mut table = output::create_table();
    table.set_header(normalized.table.columns().to_vec());
    for row in normalized.table.rows().iter().take(limit) {
        table.add_row(row.iter().map(output::cell_text).collect::<Vec<_>>());
    }
    println!("{}", table);

    if normalized.row_count() > limit {
        output::info(&format!("… {} more rows", normalized.row_count() - limit));
    }
    for issue in &normalized.dropped {
        output::warning(&format!("Dropped {}", issue));
    }
    for warning in &warnings {
        output::warning(&format!("⚠ {}", warning));
    }
    Ok(())
}

/// Stage and normalize one file; staging problems come back as warnings
/// and never replace the normalize outcome
fn load_statement(
    upload: &UploadService,
    staging_dir: Option<&Path>,
    file: &Path,
    bank: Bank,
    policy: RowPolicy,
) -> (extractos_core::Result<NormalizedTable>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut staging = match StagingArea::new(staging_dir) {
        Ok(staging) => Some(staging),
        Err(e) => {
            warnings.push(format!("Could not create staging area: {}", e));
            None
        }
    };
    let result = upload
        .receive(file, bank, staging.as_mut())
        .and_then(|raw| normalize(&raw, policy));
    if let Some(Err(e)) = staging.map(StagingArea::close) {
        warnings.push(format!("Could not remove staging area: {}", e));
    }
    (result, warnings)
}

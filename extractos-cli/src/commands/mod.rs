//! CLI command implementations

pub mod banks;
pub mod config;
pub mod merge_dir;
pub mod preview;
pub mod process;

use std::path::PathBuf;

use anyhow::{Context, Result};
use extractos_core::services::LogEvent;
use extractos_core::{Bank, ExtractosContext, RowPolicy};

/// Log a command event (never fails)
pub fn log_event(event: LogEvent) {
    event.emit();
}

/// Get the extractos directory from environment or default
pub fn get_extractos_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("EXTRACTOS_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir().context("Could not find the user configuration directory")?;
    Ok(base.join("extractos"))
}

/// Load settings and build the context
pub fn get_context() -> Result<ExtractosContext> {
    let dir = get_extractos_dir()?;
    let ctx = ExtractosContext::new(&dir)
        .with_context(|| format!("Failed to load settings from {}", dir.display()))?;
    Ok(ctx)
}

/// Parse a `--bank` value
pub fn parse_bank(value: &str) -> Result<Bank> {
    Ok(value.parse::<Bank>()?)
}

/// Command-line row policy, falling back to the configured one
pub fn resolve_policy(flag: Option<&str>, configured: RowPolicy) -> Result<RowPolicy> {
    match flag {
        Some(value) => Ok(value.parse::<RowPolicy>()?),
        None => Ok(configured),
    }
}

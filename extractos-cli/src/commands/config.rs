//! Config command - show and change settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use extractos_core::config::{Config, SETTING_KEYS};
use extractos_core::services::LogEvent;

use super::{get_extractos_dir, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting, e.g. `rowPolicy fail`
    Set {
        /// Setting key (rowPolicy, maxFileSizeBytes, upload.maxAttempts, ...)
        key: String,
        /// New value (empty to clear stagingDir)
        value: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let dir = get_extractos_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            println!("{}", format!("Settings ({})", dir.join("settings.json").display()).bold());
            println!();
            let mut table = output::create_table();
            table.set_header(vec!["Key", "Value"]);
            for (key, value) in rows(&config) {
                table.add_row(vec![key.to_string(), value]);
            }
            println!("{}", table);
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(&dir)?;
            config.set(&key, &value)?;
            config.save(&dir)?;
            log_event(LogEvent::new("config_set").with_command("config set"));
            output::success(&format!("✓ {} updated", key));
        }
    }
    Ok(())
}

fn rows(config: &Config) -> Vec<(&'static str, String)> {
    let values = [
        config.row_policy.to_string(),
        format!(
            "{} ({})",
            config.max_file_size_bytes,
            output::format_size(config.max_file_size_bytes)
        ),
        config.upload.max_attempts.to_string(),
        config.upload.retry_delay_ms.to_string(),
        config.output.file_name.clone(),
        config.output.sheet_name.clone(),
        config
            .staging_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(system temp)".to_string()),
    ];
    SETTING_KEYS.iter().copied().zip(values).collect()
}

//! Extractos CLI - merge Argentine bank statements into one workbook

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{banks, config, merge_dir, preview, process};

/// Extractos - normalize and merge bank statements
#[derive(Parser)]
#[command(name = "extractos", version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize statement files and merge them into one workbook
    Process {
        /// Statement files (.xlsx, .xls, .ods, .csv, .txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Bank of each file, in file order (asked interactively if omitted)
        #[arg(long = "bank", short)]
        banks: Vec<String>,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// What to do with unparsable rows: drop or fail
        #[arg(long)]
        row_policy: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize one statement and print its rows
    Preview {
        /// Statement file
        file: PathBuf,
        /// Bank the statement comes from
        #[arg(long, short)]
        bank: String,
        /// Maximum rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// What to do with unparsable rows: drop or fail
        #[arg(long)]
        row_policy: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported banks and their formats
    Banks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge every .xlsx workbook in a directory
    MergeDir {
        /// Directory holding the workbooks
        dir: PathBuf,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    extractos_core::services::logging::init(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<extractos_core::Error>() {
                Some(core) => output::error(&format!("{}: {}", core.kind(), core)),
                None => output::error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process { files, banks, output, row_policy, json } => {
            process::run(files, banks, output, row_policy.as_deref(), json)
        }
        Commands::Preview { file, bank, limit, row_policy, json } => {
            preview::run(&file, &bank, limit, row_policy.as_deref(), json)
        }
        Commands::Banks { json } => banks::run(json),
        Commands::MergeDir { dir, output, json } => merge_dir::run(&dir, output, json),
        Commands::Config { command } => config::run(command),
    }
}

//! Extractos Core - bank statement normalization and merging
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Bank, RawStatementFile, Table, etc.)
//! - **ports**: Trait definitions for external dependencies (SheetReader, ProgressObserver)
//! - **banks**: Per-bank statement layouts
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (csv, calamine, rust_xlsxwriter)

pub mod adapters;
pub mod banks;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;

use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Bank, Column, FileFormat, NormalizedTable, RawStatementFile, RowIssue, RowPolicy, Table, Value,
};

/// Main context for Extractos operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration and the services built from it.
pub struct ExtractosContext {
    pub config: Config,
    pub upload_service: UploadService,
    pub process_service: ProcessService,
    pub export_service: ExportService,
    pub merge_service: MergeService,
}

impl ExtractosContext {
    /// Create a new Extractos context from the settings in `extractos_dir`
    pub fn new(extractos_dir: &Path) -> Result<Self> {
        let config = Config::load(extractos_dir)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        let upload_service = UploadService::new(config.max_file_size_bytes, config.retry_policy());
        let process_service = ProcessService::new(
            upload_service.clone(),
            config.row_policy,
            config.staging_dir.clone(),
        );
        let export_service =
            ExportService::new(config.output.sheet_name.clone(), config.output.file_name.clone());

        Self {
            config,
            upload_service,
            process_service,
            export_service,
            merge_service: MergeService::new(),
        }
    }
}

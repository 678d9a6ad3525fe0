//! Process service - the full batch: receive, normalize and merge
//!
//! A failing file never stops the batch. Only input validation (no files,
//! mismatched bank selections) refuses to start.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{Bank, NormalizedTable, RowIssue, RowPolicy, Table};
use crate::ports::ProgressObserver;

use super::logging::LogEvent;
use super::merge::merge;
use super::normalize::normalize;
use super::upload::{StagingArea, UploadService};

/// Warning added when no file of the batch could be normalized
pub const NOTHING_PROCESSED: &str = "No file could be processed";

/// Outcome of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum FileStatus {
    /// Normalized; `dropped` rows were left out under the drop policy
    Processed { rows: usize, dropped: Vec<RowIssue> },
    /// Excluded before reading (over the size cap)
    Skipped { kind: String, message: String },
    /// Could not be read or did not match its bank layout
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub bank: Bank,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_processed(&self) -> bool {
        matches!(self.status, FileStatus::Processed { .. })
    }
}

/// Result of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// Merged table, absent when no file was processed
    #[serde(skip)]
    pub table: Option<Table>,
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.files.iter().filter(|f| f.is_processed()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.processed()
    }
}

/// Runs a batch of statement files through the pipeline
#[derive(Debug, Clone)]
pub struct ProcessService {
    upload: UploadService,
    policy: RowPolicy,
    staging_base: Option<PathBuf>,
}

impl ProcessService {
    pub fn new(upload: UploadService, policy: RowPolicy, staging_base: Option<PathBuf>) -> Self {
        Self {
            upload,
            policy,
            staging_base,
        }
    }

    pub fn policy(&self) -> RowPolicy {
        self.policy
    }

    /// Use a different row policy for this service
    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process `files[i]` as a statement of `banks[i]`, then merge
    pub fn process(
        &self,
        files: &[PathBuf],
        banks: &[Bank],
        observer: &dyn ProgressObserver,
    ) -> Result<BatchReport> {
        if files.is_empty() {
            return Err(Error::empty_input("No statement files were given"));
        }
        if banks.is_empty() {
            return Err(Error::empty_input("No bank was selected"));
        }
        if files.len() != banks.len() {
            return Err(Error::validation(format!(
                "{} files but {} bank selections; every file needs exactly one bank",
                files.len(),
                banks.len()
            )));
        }

        let mut warnings = Vec::new();
        // Files are still processed without staged copies
        let mut staging = match StagingArea::new(self.staging_base.as_deref()) {
            Ok(staging) => Some(staging),
            Err(e) => {
                LogEvent::new("staging_unavailable")
                    .with_error(e.to_string())
                    .emit();
                warnings.push(format!("{}: could not create staging area: {}", e.kind(), e));
                None
            }
        };
        let total = files.len();
        let mut reports = Vec::with_capacity(total);
        let mut tables = Vec::new();

        for (index, (path, &bank)) in files.iter().zip(banks).enumerate() {
            let name = display_name(path);
            observer.file_started(index, total, &name, bank);

            let outcome = self
                .upload
                .receive(path, bank, staging.as_mut())
                .and_then(|raw| normalize(&raw, self.policy));

            let report = match outcome {
                Ok(normalized) => {
                    let report = processed_report(&normalized);
                    tables.push(normalized.table);
                    report
                }
                Err(e) => failed_report(&name, bank, &e),
            };
            observer.file_finished(index, total, &name, report.is_processed());
            reports.push(report);
        }

        let table = if tables.is_empty() {
            LogEvent::new("batch_empty").with_error(NOTHING_PROCESSED).emit();
            warnings.push(NOTHING_PROCESSED.to_string());
            None
        } else {
            observer.merging(tables.len());
            Some(merge(&tables)?)
        };

        // Always runs; a cleanup failure only warns
        if let Some(Err(e)) = staging.map(StagingArea::close) {
            LogEvent::new("staging_cleanup_failed")
                .with_error(e.to_string())
                .emit();
            warnings.push(format!("{}: could not remove staging area: {}", e.kind(), e));
        }

        let (columns, total_rows) = table
            .as_ref()
            .map(|t| (t.columns().to_vec(), t.row_count()))
            .unwrap_or_default();

        Ok(BatchReport {
            files: reports,
            table,
            columns,
            total_rows,
            warnings,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn processed_report(normalized: &NormalizedTable) -> FileReport {
    for issue in &normalized.dropped {
        tracing::warn!(file = %normalized.source, row = issue.row, reason = %issue.reason, "row dropped");
    }
    FileReport {
        file: normalized.source.clone(),
        bank: normalized.bank,
        status: FileStatus::Processed {
            rows: normalized.row_count(),
            dropped: normalized.dropped.clone(),
        },
    }
}

fn failed_report(name: &str, bank: Bank, error: &Error) -> FileReport {
    LogEvent::new("file_failed")
        .with_file(name)
        .with_bank(bank)
        .with_error(error.to_string())
        .with_error_details(error.kind())
        .emit();

    let kind = error.kind().to_string();
    let message = error.to_string();
    let status = match error {
        Error::SizeLimitExceeded { .. } => FileStatus::Skipped { kind, message },
        _ => FileStatus::Failed { kind, message },
    };
    FileReport {
        file: name.to_string(),
        bank,
        status,
    }
}

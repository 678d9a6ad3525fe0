//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod export;
pub mod logging;
mod merge;
mod normalize;
mod process;
pub mod upload;

pub use export::{ExportService, DEFAULT_FILE_NAME, DEFAULT_SHEET_NAME};
pub use logging::LogEvent;
pub use merge::{merge, MergeService};
pub use normalize::normalize;
pub use process::{BatchReport, FileReport, FileStatus, ProcessService, NOTHING_PROCESSED};
pub use upload::{RetryPolicy, StagingArea, UploadService, DEFAULT_MAX_FILE_SIZE};

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - csv for delimited text exports
//! - calamine for workbook exports
//! - rust_xlsxwriter for the merged output workbook

pub mod delimited;
pub mod workbook;
pub mod xlsx_writer;

pub use delimited::DelimitedReader;
pub use workbook::{sniff_format, WorkbookReader};
pub use xlsx_writer::{excel_serial, from_excel_serial};

use crate::domain::FileFormat;
use crate::ports::SheetReader;

/// Reader for a declared file format
pub fn reader_for(format: FileFormat) -> Box<dyn SheetReader> {
    match format {
        FileFormat::Workbook => Box::new(WorkbookReader::new()),
        FileFormat::Delimited => Box::new(DelimitedReader::new()),
    }
}

//! Export service - unified table to a single-sheet workbook

use std::path::{Path, PathBuf};

use crate::adapters::xlsx_writer::write_table;
use crate::domain::result::{Error, Result};
use crate::domain::Table;

pub const DEFAULT_SHEET_NAME: &str = "Estados Fusionados";
pub const DEFAULT_FILE_NAME: &str = "estados_de_cuenta_fusionados.xlsx";

#[derive(Debug, Clone)]
pub struct ExportService {
    sheet_name: String,
    file_name: String,
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME, DEFAULT_FILE_NAME)
    }
}

impl ExportService {
    pub fn new(sheet_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Render the workbook in memory
    pub fn to_buffer(&self, table: &Table) -> Result<Vec<u8>> {
        write_table(table, &self.sheet_name)
    }

    /// Write the workbook to `target`
    ///
    /// A directory target receives the configured file name; the parent
    /// directory of a file target must exist.
    pub fn write(&self, table: &Table, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(&self.file_name)
        } else {
            target.to_path_buf()
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Output directory {} does not exist", parent.display()),
                )));
            }
        }

        let bytes = self.to_buffer(table)?;
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "wrote workbook");
        Ok(path)
    }
}

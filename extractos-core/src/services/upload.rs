//! Upload service - receiving statement files into a batch staging area
//!
//! Files are size-checked before they are read, read under a retry policy
//! for transient I/O errors, and copied into a temporary staging directory
//! that is removed when the batch ends.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use crate::domain::result::{Error, Result};
use crate::domain::{Bank, FileFormat, RawStatementFile};

/// Default upload cap: 200 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 200 * 1024 * 1024;

/// Default number of read attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between read attempts
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Check if an I/O error is worth another attempt
fn is_retryable_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// How often and how patiently file reads are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable_error(&e) && attempt < attempts => {
                    tracing::warn!(
                        file = what,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "transient I/O error, retrying"
                    );
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Scoped temporary directory holding one batch's received files
///
/// The directory is deleted when the value is dropped, on every exit path.
/// Use [`StagingArea::close`] to observe cleanup failures.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    staged: usize,
}

impl StagingArea {
    /// Create a staging directory under `base`, or the system temp dir
    pub fn new(base: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("extractos-");
        let dir = match base {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "created staging area");
        Ok(Self { dir, staged: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `bytes` into the staging area under a unique name
    pub fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.staged += 1;
        let file_name = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement".to_string());
        let path = self
            .dir
            .path()
            .join(format!("{:03}-{}", self.staged, file_name));

        std::fs::write(&path, bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))?;
        }
        Ok(path)
    }

    /// Remove the staging directory, reporting a cleanup failure
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(path = %path.display(), "removed staging area");
        Ok(())
    }
}

/// Receives statement files from disk
#[derive(Debug, Clone)]
pub struct UploadService {
    max_file_size: u64,
    retry: RetryPolicy,
}

impl Default for UploadService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, RetryPolicy::default())
    }
}

impl UploadService {
    pub fn new(max_file_size: u64, retry: RetryPolicy) -> Self {
        Self { max_file_size, retry }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Read `path` as a statement of `bank` and stage a copy of it when a
    /// staging area is available
    ///
    /// The size cap is checked from file metadata before any bytes are read.
    pub fn receive(
        &self,
        path: &Path,
        bank: Bank,
        staging: Option<&mut StagingArea>,
    ) -> Result<RawStatementFile> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let format = FileFormat::from_path(path).ok_or_else(|| {
            Error::format(format!(
                "{}: unsupported file type, expected .xlsx, .xls, .ods, .csv or .txt",
                name
            ))
        })?;

        let size = self.retry.run(&name, || std::fs::metadata(path))?.len();
        self.check_size(&name, size)?;

        let bytes = self.retry.run(&name, || std::fs::read(path))?;
        // The file may have grown between the metadata check and the read
        self.check_size(&name, bytes.len() as u64)?;

        match staging {
            Some(staging) => {
                let staged = staging.stage(&name, &bytes)?;
                tracing::debug!(file = %name, staged = %staged.display(), size, "received statement");
            }
            None => tracing::debug!(file = %name, size, "received statement without staging"),
        }

        Ok(RawStatementFile::new(name, bytes, bank, format))
    }

    fn check_size(&self, name: &str, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(Error::SizeLimitExceeded {
                name: name.to_string(),
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_retry_transient_then_success() {
        let calls = Cell::new(0);
        let result = quick(3).run("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(io::Error::new(io::ErrorKind::Interrupted, "busy"))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: io::Result<()> = quick(2).run("test", || {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::TimedOut, "slow"))
        });
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: io::Result<()> = quick(5).run("test", || {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_receive_rejects_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.csv");
        std::fs::write(&path, vec![b'x'; 64]).unwrap();

        let mut staging = StagingArea::new(Some(dir.path())).unwrap();
        let service = UploadService::new(10, quick(1));
        let err = service.receive(&path, Bank::Galicia, Some(&mut staging)).unwrap_err();

        assert_eq!(err.kind(), "SizeLimitExceeded");
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_receive_stages_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galicia.csv");
        std::fs::write(&path, b"Fecha;Descripcion\n").unwrap();

        let mut staging = StagingArea::new(Some(dir.path())).unwrap();
        let file = UploadService::default()
            .receive(&path, Bank::Galicia, Some(&mut staging))
            .unwrap();

        assert_eq!(file.name(), "galicia.csv");
        assert_eq!(file.format(), FileFormat::Delimited);
        assert_eq!(file.bytes(), b"Fecha;Descripcion\n");
        let staged: Vec<_> = std::fs::read_dir(staging.path()).unwrap().collect();
        assert_eq!(staged.len(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let entry = staged.into_iter().next().unwrap().unwrap();
            let mode = entry.metadata().unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }

        let staging_path = staging.path().to_path_buf();
        staging.close().unwrap();
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let mut staging = StagingArea::new(None).unwrap();
        let err = UploadService::default()
            .receive(&path, Bank::Macro, Some(&mut staging))
            .unwrap_err();
        assert_eq!(err.kind(), "FormatError");
    }

    #[test]
    fn test_staging_removed_on_drop() {
        let staging = StagingArea::new(None).unwrap();
        let path = staging.path().to_path_buf();
        assert!(path.exists());
        drop(staging);
        assert!(!path.exists());
    }
}

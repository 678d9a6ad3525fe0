//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// File larger than the configured upload cap
    #[error("File {name} is {size} bytes, over the {limit} byte limit")]
    SizeLimitExceeded { name: String, size: u64, limit: u64 },

    /// File structure or cell contents do not match the declared bank layout
    #[error("Format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to process
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook write error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an empty input error
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable kind name reported to users next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SizeLimitExceeded { .. } => "SizeLimitExceeded",
            Error::Format(_) => "FormatError",
            Error::Io(_) => "IOError",
            Error::EmptyInput(_) => "EmptyInputError",
            Error::Validation(_) => "ValidationError",
            Error::Config(_) | Error::Json(_) => "ConfigError",
            Error::Export(_) => "IOError",
        }
    }
}

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Error::Format(format!("Unreadable workbook: {}", e))
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Format(format!("Unreadable delimited file: {}", e))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::format("bad header").kind(), "FormatError");
        assert_eq!(Error::empty_input("no files").kind(), "EmptyInputError");
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.kind(), "IOError");
        let size = Error::SizeLimitExceeded {
            name: "big.csv".into(),
            size: 10,
            limit: 5,
        };
        assert_eq!(size.kind(), "SizeLimitExceeded");
        assert!(size.to_string().contains("big.csv"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::format("Header row not found").to_string(),
            "Format error: Header row not found"
        );
        assert!(Error::validation("2 files, 1 bank").to_string().starts_with("Validation error"));
    }
}

//! Logging service - structured events over `tracing`
//!
//! Events carry only file names, bank tags, counts and error messages. No
//! statement contents (amounts, descriptions, balances) are ever logged.
//!
//! The subscriber is installed once by the binary through [`init`]; the
//! library itself only emits events.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::domain::Bank;

/// Default filter when `RUST_LOG` is unset, by `-v` count
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "extractos=warn,extractos_core=warn,extractos_cli=warn",
        1 => "extractos=info,extractos_core=info,extractos_cli=info",
        _ => "extractos=debug,extractos_core=debug,extractos_cli=debug",
    }
}

/// Install the stderr subscriber
///
/// `RUST_LOG` wins over the verbosity flag when set. Calling this twice is
/// harmless: the second subscriber is not installed.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// A log event to be recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_bank(mut self, bank: Bank) -> Self {
        self.bank = Some(bank);
        self
    }

    /// Set the statement file name
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set error information
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set error details (kind name, additional context)
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Record the event: `warn` when it carries an error, `info` otherwise
    pub fn emit(&self) {
        let command = self.command.as_deref();
        let bank = self.bank.map(|b| b.display_name());
        let file = self.file.as_deref();
        let details = self.error_details.as_deref();

        match &self.error_message {
            Some(error) => tracing::warn!(
                event = %self.event,
                command,
                bank,
                file,
                error = %error,
                details,
                "{}",
                self.event
            ),
            None => tracing::info!(event = %self.event, command, bank, file, "{}", self.event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_builder() {
        let event = LogEvent::new("file_failed")
            .with_command("process")
            .with_bank(Bank::Icbc)
            .with_file("icbc.xlsx")
            .with_error("Format error: Header row not found")
            .with_error_details("FormatError");

        assert!(event.is_error());
        assert_eq!(event.bank, Some(Bank::Icbc));
        assert_eq!(event.file.as_deref(), Some("icbc.xlsx"));
        event.emit();
    }

    #[test]
    fn test_log_event_serializes_only_set_fields() {
        let json = serde_json::to_value(LogEvent::new("command_run").with_command("banks")).unwrap();
        assert_eq!(json["event"], "command_run");
        assert_eq!(json["command"], "banks");
        assert!(json.get("error_message").is_none());
        assert!(json.get("bank").is_none());
    }

    #[test]
    fn test_default_directive_by_verbosity() {
        assert!(default_directive(0).contains("=warn"));
        assert!(default_directive(1).contains("=info"));
        assert!(default_directive(5).contains("=debug"));
    }
}

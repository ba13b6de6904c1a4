//! crates/logtree/src/error.rs
//! Error type shared by every fallible logtree operation.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T, E = LoggingError> = std::result::Result<T, E>;

/// Errors surfaced to callers of the logging facility.
///
/// Only configuration and programming mistakes are reported here. Failures
/// that happen while a handler writes a record are contained by
/// [`Handler::handle_error`](crate::Handler::handle_error) and never reach
/// the emitting caller.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The value is neither a known level name nor a known numeric weight.
    #[error("invalid level {0:?} is not a valid level name or number")]
    InvalidLevel(String),

    /// A configuration directive could not be parsed.
    #[error("invalid logging directive {directive:?}: {reason}")]
    InvalidDirective {
        /// The offending directive text.
        directive: String,
        /// Why the directive was rejected.
        reason: String,
    },

    /// A date pattern was rejected by the time formatter.
    #[error("invalid date format {format:?}: {reason}")]
    InvalidDateFormat {
        /// The offending pattern.
        format: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A formatter asked a record for a field it does not carry.
    #[error("log record has no field named {0:?}")]
    UnknownField(String),

    /// I/O failure while setting up a sink.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl LoggingError {
    /// Creates an I/O error with a human readable context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn directive(directive: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDirective {
            directive: directive.to_owned(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_level_names_the_value() {
        let error = LoggingError::InvalidLevel("LOUD".into());
        assert!(error.to_string().contains("\"LOUD\""));
    }

    #[test]
    fn io_error_preserves_source() {
        let error = LoggingError::io(
            "opening /var/log/app.log",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.to_string().starts_with("opening /var/log/app.log"));
        assert_eq!(error.source().unwrap().to_string(), "denied");
    }

    #[test]
    fn directive_error_carries_reason() {
        let error = LoggingError::directive("app=", "missing level");
        let display = error.to_string();
        assert!(display.contains("app="));
        assert!(display.contains("missing level"));
    }
}

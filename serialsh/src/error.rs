//! Error types for serialsh.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for serialsh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Console-level errors (reading, writing, matching)
    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Invalid driver configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error is one of the timeout failures.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Console(ConsoleError::Timeout(_))
                | Error::Console(ConsoleError::ConnectTimeout { .. })
                | Error::Driver(DriverError::SynchronizationTimeout { .. })
                | Error::Driver(DriverError::ValidationTimeout { .. })
                | Error::Driver(DriverError::CommandTimeout { .. })
        )
    }
}

/// Console errors (the byte stream and its match primitive).
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// No pattern matched within the timeout and no timeout sentinel was given
    #[error("Pattern not found within {0:?}")]
    Timeout(Duration),

    /// The peer closed the stream
    #[error("Console closed")]
    Closed,

    /// Connecting to a network console timed out
    #[error("Connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver errors (synchronization, validation, command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// The prompt never showed up before the login deadline
    #[error("Timeout of {login_timeout:?} exceeded while waiting for the prompt")]
    SynchronizationTimeout { login_timeout: Duration },

    /// The prompt was seen but the shell did not answer the validation command
    #[error("Shell did not answer during {stage} within {timeout:?}")]
    ValidationTimeout {
        stage: ValidationStage,
        timeout: Duration,
    },

    /// A command did not return to the prompt in time
    #[error("Command '{command}' timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    /// Guarded operation called while the driver is inactive
    #[error("Driver not active - call activate() first")]
    NotActive,

    /// Command output contained a failure marker
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Operation the shell cannot provide
    #[error("Operation '{operation}' is not supported")]
    Unsupported { operation: &'static str },
}

/// Validator step that timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    /// Waiting for the "command not found" reply
    NotFoundReply,
    /// Waiting for the prompt after the reply
    Prompt,
}

impl std::fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStage::NotFoundReply => write!(f, "not-found reply"),
            ValidationStage::Prompt => write!(f, "prompt"),
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An empty prompt would match any output
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using serialsh's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let err: Error = DriverError::SynchronizationTimeout {
            login_timeout: Duration::from_secs(5),
        }
        .into();
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Driver error: Timeout of 5s exceeded while waiting for the prompt"
        );

        let err: Error = DriverError::NotActive.into();
        assert!(!err.is_timeout());

        let err: Error = ConsoleError::Closed.into();
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_validation_stage_display() {
        let err = DriverError::ValidationTimeout {
            stage: ValidationStage::NotFoundReply,
            timeout: Duration::from_secs(2),
        };
        assert_eq!(
            err.to_string(),
            "Shell did not answer during not-found reply within 2s"
        );
    }
}

//! Error handling for typosquat screening.
//!
//! Lookup and timeout errors are per-task: the orchestrator turns them into
//! `error` outcomes. Everything else (bad input, bad configuration, file and
//! delivery failures) is fatal to a run.

use crate::types::LookupKind;
use std::time::Duration;
use thiserror::Error;

/// Main error type for screening operations.
#[derive(Debug, Clone, Error)]
pub enum ScreenError {
    /// Network or protocol failure reaching a lookup source
    #[error("{kind} lookup failed for '{domain}': {message}")]
    Lookup {
        kind: LookupKind,
        domain: String,
        message: String,
    },

    /// An operation exceeded its time budget
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Malformed input, e.g. a candidate list that is not valid JSON
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Missing or invalid configuration (credentials, endpoint, settings)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The results endpoint rejected the delivery
    #[error("Delivery error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Delivery {
        status: Option<u16>,
        message: String,
    },

    /// File I/O errors when reading input or writing reports
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },

    /// Errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScreenError {
    /// Create a new lookup error.
    pub fn lookup<D: Into<String>, M: Into<String>>(kind: LookupKind, domain: D, message: M) -> Self {
        Self::Lookup {
            kind,
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new delivery error.
    pub fn delivery<M: Into<String>>(status: Option<u16>, message: M) -> Self {
        Self::Delivery {
            status,
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ScreenError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}

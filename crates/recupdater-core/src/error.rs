//! Error types for recupdater
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for recupdater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Neither an IPv4 nor an IPv6 address could be determined
    #[error("Cannot get your IP from '{service}'")]
    IpResolution {
        /// The lookup service that was queried
        service: String,
    },

    /// The provider answered without the success marker
    #[error("{message}")]
    ProviderRejected {
        /// Message extracted from the response body, or "Unknown error"
        message: String,
    },

    /// The HTTP request itself failed (connection error, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP resolution error
    pub fn ip_resolution(service: impl Into<String>) -> Self {
        Self::IpResolution {
            service: service.into(),
        }
    }

    /// Create a provider rejection
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors produced while loading the configuration file
///
/// All of them are fatal at startup. Only [`ConfigError::Missing`] leads to
/// an attempt to write a default configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file does not exist or cannot be opened
    #[error("Missing config file '{path}'")]
    Missing {
        /// Path that was tried
        path: String,
    },

    /// One or more required attributes were not assigned
    #[error("Missing attributes in config: {}", missing.join(", "))]
    IncompleteAttributes {
        /// Names of the attributes that were not found
        missing: Vec<String>,
    },

    /// A line could not be understood
    #[error("Syntax error in config (line {line}): {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
}

impl ConfigError {
    /// Create a syntax error for the given line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

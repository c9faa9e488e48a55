//! Domain error types for server startup.
//!
//! Handshake and session failures are absorbed at the route boundary, so the
//! only errors the server surfaces are configuration errors, and those stop
//! the process before it listens.

use std::fmt;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    Load { details: String },
    /// A required field is absent or blank.
    Missing { field: String },
    /// A field is present but unusable.
    Invalid { field: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { details } => write!(f, "failed to load configuration: {details}"),
            Self::Missing { field } => write!(f, "missing required configuration: {field}"),
            Self::Invalid { field, reason } => {
                write!(f, "invalid configuration for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

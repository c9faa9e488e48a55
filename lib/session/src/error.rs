//! Error types for the session crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `HandshakeError`: Failures while completing a provider handshake
//! - `SessionError`: Failures while writing, reading, or projecting sessions

use std::fmt;

/// Errors from the provider handshake.
///
/// All of these are recovered at the route boundary by redirecting back to
/// the login entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The provider redirected back with an `error` parameter.
    ProviderRejected {
        error: String,
        description: Option<String>,
    },
    /// The callback carried neither a code nor an error.
    MissingCode,
    /// The handshake state from `begin_handshake` was not presented.
    MissingState,
    /// The handshake state could not be decoded.
    InvalidState { reason: String },
    /// Provider metadata discovery failed.
    Discovery { reason: String },
    /// Exchanging the authorization code failed.
    TokenExchange { reason: String },
    /// The returned ID token did not validate.
    TokenValidation { reason: String },
    /// A claim needed to build a principal was absent.
    MissingClaim { claim: String },
}

impl HandshakeError {
    /// Short code suitable for a flash message.
    #[must_use]
    pub fn flash_code(&self) -> &'static str {
        match self {
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::MissingCode | Self::MissingState | Self::InvalidState { .. } => {
                "invalid_callback"
            }
            Self::Discovery { .. } | Self::TokenExchange { .. } => "provider_unavailable",
            Self::TokenValidation { .. } | Self::MissingClaim { .. } => "invalid_identity",
        }
    }
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderRejected { error, description } => match description {
                Some(description) => write!(f, "provider rejected login: {error} ({description})"),
                None => write!(f, "provider rejected login: {error}"),
            },
            Self::MissingCode => write!(f, "callback carried no authorization code"),
            Self::MissingState => write!(f, "handshake state is missing"),
            Self::InvalidState { reason } => write!(f, "invalid handshake state: {reason}"),
            Self::Discovery { reason } => write!(f, "provider discovery failed: {reason}"),
            Self::TokenExchange { reason } => write!(f, "token exchange failed: {reason}"),
            Self::TokenValidation { reason } => write!(f, "ID token validation failed: {reason}"),
            Self::MissingClaim { claim } => write!(f, "missing required claim: {claim}"),
        }
    }
}

impl std::error::Error for HandshakeError {}

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The serialize hook could not project the principal.
    Serialize { reason: String },
    /// The stored payload did not match the deserialize hook's shape.
    Deserialize { reason: String },
    /// The session store failed.
    Store { operation: String, details: String },
    /// An expiry time fell outside the representable range.
    Expiry { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { reason } => write!(f, "failed to serialize principal: {reason}"),
            Self::Deserialize { reason } => {
                write!(f, "failed to deserialize session payload: {reason}")
            }
            Self::Store { operation, details } => {
                write!(f, "session store {operation} failed: {details}")
            }
            Self::Expiry { reason } => write!(f, "invalid session expiry: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

//! Session records.
//!
//! A session is created only once a login completes and holds the projected
//! principal until it expires or is invalidated.

use chrono::{DateTime, Duration, Utc};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;

/// Unique identifier for a session.
///
/// Session IDs are opaque strings generated during session creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh session ID using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A server-side session record.
///
/// The payload is whatever the serialize hook produced; the session itself
/// does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,
    /// Serialized principal, absent once cleared.
    payload: Option<Value>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session holding `payload`, valid for `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expiry`] if `duration` pushes the expiry past
    /// the range of [`DateTime<Utc>`].
    pub fn new(
        id: SessionId,
        payload: Value,
        duration: Duration,
    ) -> Result<Self, Report<SessionError>> {
        let now = Utc::now();
        let expires_at = expiry_after(now, duration)?;
        Ok(Self {
            id,
            payload: Some(payload),
            created_at: now,
            expires_at,
        })
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the stored payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the session is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Removes the principal from the session.
    pub fn clear_payload(&mut self) {
        self.payload = None;
    }

    /// Moves the expiration to `expires_at`.
    pub fn set_expires_at(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = expires_at;
    }
}

/// Returns `now + duration`, or an error if it overflows.
pub fn expiry_after(
    now: DateTime<Utc>,
    duration: Duration,
) -> Result<DateTime<Utc>, Report<SessionError>> {
    now.checked_add_signed(duration).ok_or_else(|| {
        SessionError::Expiry {
            reason: format!("{}s from {now} is out of range", duration.num_seconds()),
        }
        .into()
    })
}

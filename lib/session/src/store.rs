//! Session storage.
//!
//! `SessionStore` is the seam between session logic and the backend holding
//! records. Route and gate code only ever see the trait, so an external
//! key-value store can replace the in-memory backend without touching them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::SessionError;
use crate::session::{Session, SessionId};

/// Key-value storage for sessions with expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches a live session. Expired records are reported as absent.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<SessionError>>;

    /// Inserts or replaces a session.
    async fn set(&self, session: Session) -> Result<(), Report<SessionError>>;

    /// Removes a session. Returns whether a record existed.
    async fn delete(&self, id: &SessionId) -> Result<bool, Report<SessionError>>;

    /// Moves a session's expiry. Returns whether a record existed.
    async fn expire(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, Report<SessionError>>;

    /// Removes every expired session, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, Report<SessionError>>;
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    #[instrument(skip(self), fields(session_id = %id))]
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Report<SessionError>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(session) if !session.is_expired_at(now) => return Ok(Some(session.clone())),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|s| s.is_expired_at(now)) {
            sessions.remove(id);
            debug!("Dropped expired session on read");
        }
        Ok(None)
    }

    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    async fn set(&self, session: Session) -> Result<(), Report<SessionError>> {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session);
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn delete(&self, id: &SessionId) -> Result<bool, Report<SessionError>> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn expire(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, Report<SessionError>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.set_expires_at(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self) -> Result<u64, Report<SessionError>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

//! The auth gate: resolving credentials into a request context.
//!
//! Every request passes through [`AuthGate::resolve`] before a handler runs.
//! Sessions are only written when a login completes ([`AuthGate::establish`]),
//! when a session is invalidated, or when rolling expiration is enabled.

use chrono::{DateTime, Duration, Utc};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::error::SessionError;
use crate::principal::{Principal, SessionUser};
use crate::projection::PrincipalProjection;
use crate::session::{Session, SessionId, expiry_after};
use crate::store::SessionStore;
use crate::token::SessionSecret;

/// A session credential ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    credential: String,
    expires_at: DateTime<Utc>,
    max_age: Duration,
}

impl IssuedSession {
    /// The signed credential for the cookie value.
    #[must_use]
    pub fn credential(&self) -> &str {
        &self.credential
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Lifetime to advertise on the cookie.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}

/// What the response should do with the client's session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialAction {
    /// Leave the client's cookie alone.
    Keep,
    /// Re-issue the credential with a fresh expiry.
    Renew(IssuedSession),
    /// The credential is dead; remove it.
    Clear,
}

/// Request-scoped authentication state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    user: Option<SessionUser>,
    session_id: Option<SessionId>,
    action: CredentialAction,
}

impl AuthContext {
    /// A context with no principal.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user: None,
            session_id: None,
            action: CredentialAction::Keep,
        }
    }

    fn cleared() -> Self {
        Self {
            action: CredentialAction::Clear,
            ..Self::anonymous()
        }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    #[must_use]
    pub fn credential_action(&self) -> &CredentialAction {
        &self.action
    }
}

/// Resolves, creates, and invalidates sessions.
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn SessionStore>,
    projection: Arc<dyn PrincipalProjection>,
    secret: SessionSecret,
    max_age: Duration,
    rolling: bool,
}

impl AuthGate {
    /// Creates a gate with rolling expiration disabled.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        projection: Arc<dyn PrincipalProjection>,
        secret: SessionSecret,
        max_age: Duration,
    ) -> Self {
        Self {
            store,
            projection,
            secret,
            max_age,
            rolling: false,
        }
    }

    /// Enables or disables rolling expiration.
    #[must_use]
    pub fn with_rolling(mut self, rolling: bool) -> Self {
        self.rolling = rolling;
        self
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Resolves a request's credential into its authentication context.
    ///
    /// Never fails: anything short of a valid, live, decodable session is
    /// anonymous.
    pub async fn resolve(&self, credential: Option<&str>) -> AuthContext {
        let Some(credential) = credential else {
            return AuthContext::anonymous();
        };

        let Some(session_id) = self.secret.verify(credential) else {
            debug!("Session credential failed signature check");
            return AuthContext::cleared();
        };

        self.resolve_session(session_id).await
    }

    #[instrument(skip(self, session_id), fields(session_id = %session_id))]
    async fn resolve_session(&self, session_id: SessionId) -> AuthContext {
        let session = match self.store.get(&session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("Session not found");
                return AuthContext::cleared();
            }
            Err(e) => {
                error!(error = %e, "Session store lookup failed");
                return AuthContext::anonymous();
            }
        };

        let now = Utc::now();
        if session.is_expired_at(now) {
            debug!("Session expired");
            if let Err(e) = self.store.delete(&session_id).await {
                warn!(error = %e, "Failed to delete expired session");
            }
            return AuthContext::cleared();
        }

        let Some(payload) = session.payload() else {
            debug!("Session holds no principal");
            return AuthContext::cleared();
        };

        let user = match self.projection.deserialize(payload) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Session payload did not deserialize");
                return AuthContext::cleared();
            }
        };

        let action = if self.rolling {
            self.renew(&session_id, now).await
        } else {
            CredentialAction::Keep
        };

        AuthContext {
            user: Some(user),
            session_id: Some(session_id),
            action,
        }
    }

    async fn renew(&self, session_id: &SessionId, now: DateTime<Utc>) -> CredentialAction {
        let expires_at = match expiry_after(now, self.max_age) {
            Ok(expires_at) => expires_at,
            Err(e) => {
                warn!(error = %e, "Cannot extend session");
                return CredentialAction::Keep;
            }
        };
        match self.store.expire(session_id, expires_at).await {
            Ok(true) => CredentialAction::Renew(self.issue(session_id, expires_at)),
            Ok(false) => CredentialAction::Keep,
            Err(e) => {
                warn!(error = %e, "Failed to extend session");
                CredentialAction::Keep
            }
        }
    }

    fn issue(&self, session_id: &SessionId, expires_at: DateTime<Utc>) -> IssuedSession {
        IssuedSession {
            credential: self.secret.sign(session_id),
            expires_at,
            max_age: self.max_age,
        }
    }

    /// Stores a freshly authenticated principal in a new session.
    ///
    /// Any session named by `previous` is invalidated first so a login
    /// never reuses an identifier the client already held.
    #[instrument(skip(self, principal, previous), fields(principal_id = %principal.id()))]
    pub async fn establish(
        &self,
        principal: &Principal,
        previous: Option<&str>,
    ) -> Result<IssuedSession, Report<SessionError>> {
        let payload = self.projection.serialize(principal)?;

        if let Some(previous) = previous {
            self.invalidate(previous).await?;
        }

        let session = Session::new(SessionId::generate(), payload, self.max_age)?;
        let issued = self.issue(session.id(), session.expires_at());
        debug!(session_id = %session.id(), "Establishing session");
        self.store.set(session).await?;

        Ok(issued)
    }

    /// Invalidates the session named by `credential`.
    ///
    /// Returns whether a session was removed. Unsigned or unknown
    /// credentials are not an error.
    pub async fn invalidate(&self, credential: &str) -> Result<bool, Report<SessionError>> {
        let Some(session_id) = self.secret.verify(credential) else {
            return Ok(false);
        };
        let removed = self.store.delete(&session_id).await?;
        debug!(session_id = %session_id, removed, "Invalidated session");
        Ok(removed)
    }

    /// Removes expired sessions from the store.
    pub async fn purge_expired(&self) -> Result<u64, Report<SessionError>> {
        self.store.delete_expired().await
    }
}

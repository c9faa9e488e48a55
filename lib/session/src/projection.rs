//! Serialize/deserialize hooks for principals stored in sessions.
//!
//! The projection is the single point of control over which principal data
//! enters a session. The default keeps only what is needed to answer "who
//! is this user" without asking the provider again.

use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::SessionError;
use crate::principal::{Principal, SerializedPrincipal, SessionUser};

/// Controls what a session stores for a principal and how it is read back.
pub trait PrincipalProjection: Send + Sync {
    /// Projects a principal into a session payload.
    fn serialize(&self, principal: &Principal) -> Result<Value, Report<SessionError>>;

    /// Rebuilds the session user from a stored payload.
    fn deserialize(&self, payload: &Value) -> Result<SessionUser, Report<SessionError>>;
}

/// Stores id, display name, nickname, and primary email.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReducedProjection;

impl PrincipalProjection for ReducedProjection {
    fn serialize(&self, principal: &Principal) -> Result<Value, Report<SessionError>> {
        serde_json::to_value(SerializedPrincipal::from(principal)).map_err(|e| {
            SessionError::Serialize {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn deserialize(&self, payload: &Value) -> Result<SessionUser, Report<SessionError>> {
        let serialized: SerializedPrincipal =
            serde_json::from_value(payload.clone()).map_err(|e| SessionError::Deserialize {
                reason: e.to_string(),
            })?;
        Ok(SessionUser::Reduced(serialized))
    }
}

/// Stores the whole principal as issued by the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullProfileProjection;

impl PrincipalProjection for FullProfileProjection {
    fn serialize(&self, principal: &Principal) -> Result<Value, Report<SessionError>> {
        serde_json::to_value(principal).map_err(|e| {
            SessionError::Serialize {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn deserialize(&self, payload: &Value) -> Result<SessionUser, Report<SessionError>> {
        let principal: Principal =
            serde_json::from_value(payload.clone()).map_err(|e| SessionError::Deserialize {
                reason: e.to_string(),
            })?;
        Ok(SessionUser::Full(Box::new(principal)))
    }
}

/// Configuration selector for the projection in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Reduced,
    Full,
}

impl ProjectionKind {
    /// Builds the projection this kind names.
    #[must_use]
    pub fn build(self) -> Arc<dyn PrincipalProjection> {
        match self {
            Self::Reduced => Arc::new(ReducedProjection),
            Self::Full => Arc::new(FullProfileProjection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::EmailClaim;

    fn ada() -> Principal {
        Principal::new("auth0|123".to_string(), "Ada Lovelace".to_string())
            .with_nickname(Some("ada".to_string()))
            .with_emails(vec![EmailClaim::with_verified(
                "ada@example.com".to_string(),
                true,
            )])
            .with_picture(Some("https://cdn.example.com/ada.png".to_string()))
            .with_provider("auth0".to_string())
    }

    fn assert_identity_preserved(projection: &dyn PrincipalProjection, principal: &Principal) {
        let payload = projection.serialize(principal).expect("serialize");
        let user = projection.deserialize(&payload).expect("deserialize");

        assert_eq!(user.id(), principal.id());
        assert_eq!(user.display_name(), principal.display_name());
        assert_eq!(user.nickname(), principal.nickname());
        assert_eq!(user.primary_email(), principal.primary_email());
    }

    #[test]
    fn reduced_round_trip_preserves_identity() {
        assert_identity_preserved(&ReducedProjection, &ada());
        assert_identity_preserved(
            &ReducedProjection,
            &Principal::new("sub_9".to_string(), "Bare".to_string()),
        );
    }

    #[test]
    fn full_round_trip_preserves_identity() {
        assert_identity_preserved(&FullProfileProjection, &ada());
    }

    #[test]
    fn reduced_payload_drops_unused_claims() {
        let payload = ReducedProjection.serialize(&ada()).expect("serialize");

        assert_eq!(
            payload,
            serde_json::json!({
                "id": "auth0|123",
                "display": "Ada Lovelace",
                "nickname": "ada",
                "email": "ada@example.com"
            })
        );
    }

    #[test]
    fn full_payload_keeps_profile() {
        let payload = FullProfileProjection.serialize(&ada()).expect("serialize");

        assert_eq!(payload["picture"], "https://cdn.example.com/ada.png");
        assert_eq!(payload["emails"][0]["verified"], true);
    }

    #[test]
    fn malformed_payload_fails_to_deserialize() {
        let payload = serde_json::json!({ "display": 42 });

        assert!(ReducedProjection.deserialize(&payload).is_err());
        assert!(FullProfileProjection.deserialize(&payload).is_err());
        assert!(
            ReducedProjection
                .deserialize(&serde_json::json!("just a string"))
                .is_err()
        );
    }

    #[test]
    fn projection_kind_deserializes_lowercase() {
        let kind: ProjectionKind = serde_json::from_str("\"full\"").expect("deserialize");
        assert_eq!(kind, ProjectionKind::Full);
        assert_eq!(ProjectionKind::default(), ProjectionKind::Reduced);
    }
}

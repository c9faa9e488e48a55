//! Identity strategy abstraction.
//!
//! A strategy turns a provider's redirect/callback exchange into a
//! [`Principal`]. It performs no session work: the gate owns that.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

use crate::error::HandshakeError;
use crate::principal::{EmailClaim, Principal};

/// Per-login state that must survive the round trip to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

impl HandshakeState {
    /// Encodes the state for transport in a cookie.
    ///
    /// Each field is base64url-encoded and the three are joined with `.`.
    #[must_use]
    pub fn encode(&self) -> String {
        [&self.csrf_token, &self.pkce_verifier, &self.nonce]
            .map(|field| general_purpose::URL_SAFE_NO_PAD.encode(field))
            .join(".")
    }

    /// Decodes state previously produced by [`HandshakeState::encode`].
    pub fn decode(encoded: &str) -> Result<Self, Report<HandshakeError>> {
        let mut fields = encoded.split('.').map(decode_field);
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(csrf_token), Some(pkce_verifier), Some(nonce), None) => Ok(Self {
                csrf_token: csrf_token?,
                pkce_verifier: pkce_verifier?,
                nonce: nonce?,
            }),
            _ => Err(HandshakeError::InvalidState {
                reason: "expected three fields".to_string(),
            }
            .into()),
        }
    }
}

fn decode_field(field: &str) -> Result<String, Report<HandshakeError>> {
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(field)
        .map_err(|e| HandshakeError::InvalidState {
            reason: e.to_string(),
        })?;
    let value = String::from_utf8(bytes).map_err(|e| HandshakeError::InvalidState {
        reason: e.to_string(),
    })?;
    Ok(value)
}

/// Where to send the user, plus the state to keep until the callback.
#[derive(Debug, Clone)]
pub struct HandshakeStart {
    pub authorization_url: String,
    pub state: HandshakeState,
}

/// Query parameters the provider sends back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Returns true if these parameters come from a provider redirect.
    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    /// Returns the authorization code, or the failure the provider reported.
    pub fn authorization_code(&self) -> Result<&str, Report<HandshakeError>> {
        if let Some(error) = &self.error {
            return Err(HandshakeError::ProviderRejected {
                error: error.clone(),
                description: self.error_description.clone(),
            }
            .into());
        }
        match self.code.as_deref() {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(HandshakeError::MissingCode.into()),
        }
    }
}

/// Tokens returned by the provider. Received but not retained.
#[derive(Debug, Clone, Default)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Extra token-endpoint parameters, e.g. `expires_in`.
    pub extra_params: serde_json::Map<String, serde_json::Value>,
}

/// Raw profile claims as the provider reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderProfile {
    pub subject: String,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub picture: Option<String>,
    pub provider: String,
}

/// Maps a completed handshake to a principal.
///
/// Tokens are accepted so every strategy hands over the same inputs, but
/// nothing about them is kept.
pub fn verify(
    _tokens: ProviderTokens,
    profile: ProviderProfile,
) -> Result<Principal, Report<HandshakeError>> {
    if profile.subject.trim().is_empty() {
        return Err(HandshakeError::MissingClaim {
            claim: "sub".to_string(),
        }
        .into());
    }

    let display_name = profile
        .name
        .clone()
        .or_else(|| profile.nickname.clone())
        .or_else(|| profile.email.clone())
        .unwrap_or_else(|| profile.subject.clone());

    let emails = profile
        .email
        .map(|value| match profile.email_verified {
            Some(verified) => EmailClaim::with_verified(value, verified),
            None => EmailClaim::new(value),
        })
        .into_iter()
        .collect();

    Ok(Principal::new(profile.subject, display_name)
        .with_nickname(profile.nickname)
        .with_emails(emails)
        .with_picture(profile.picture)
        .with_provider(profile.provider))
}

/// Performs the provider handshake.
#[async_trait]
pub trait IdentityStrategy: Send + Sync {
    /// Builds the authorization redirect for a new login.
    fn begin_handshake(&self) -> HandshakeStart;

    /// Completes a login from the provider's callback.
    async fn complete_handshake(
        &self,
        callback: &CallbackParams,
        state: &HandshakeState,
    ) -> Result<Principal, Report<HandshakeError>>;
}

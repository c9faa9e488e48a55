//! The normalized identity record and its session projections.
//!
//! A `Principal` is produced by the identity strategy after each successful
//! login. Only a projection of it is written into the session; see
//! [`crate::projection`].

use serde::{Deserialize, Serialize};

/// An email claim from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailClaim {
    /// The email address.
    pub value: String,
    /// Whether the provider asserted the address as verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl EmailClaim {
    /// Creates an email claim with unknown verification status.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            value,
            verified: None,
        }
    }

    /// Creates an email claim with a known verification status.
    #[must_use]
    pub fn with_verified(value: String, verified: bool) -> Self {
        Self {
            value,
            verified: Some(verified),
        }
    }
}

/// Normalized identity record issued by the provider for one login.
///
/// Immutable once built; a fresh one is issued per login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Provider-unique subject (e.g. "auth0|123").
    id: String,
    /// Human readable name.
    display_name: String,
    /// Short handle, if the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    /// Email claims in provider order; the first is primary.
    #[serde(default)]
    emails: Vec<EmailClaim>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    /// Name of the provider that issued the principal.
    #[serde(default)]
    provider: String,
}

impl Principal {
    /// Creates a principal with the required fields.
    #[must_use]
    pub fn new(id: String, display_name: String) -> Self {
        Self {
            id,
            display_name,
            nickname: None,
            emails: Vec::new(),
            picture: None,
            provider: String::new(),
        }
    }

    /// Sets the nickname.
    #[must_use]
    pub fn with_nickname(mut self, nickname: Option<String>) -> Self {
        self.nickname = nickname;
        self
    }

    /// Sets the email claims. The first entry is treated as primary.
    #[must_use]
    pub fn with_emails(mut self, emails: Vec<EmailClaim>) -> Self {
        self.emails = emails;
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_picture(mut self, picture: Option<String>) -> Self {
        self.picture = picture;
        self
    }

    /// Sets the issuing provider's name.
    #[must_use]
    pub fn with_provider(mut self, provider: String) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    #[must_use]
    pub fn emails(&self) -> &[EmailClaim] {
        &self.emails
    }

    /// Returns the primary (first) email address, if any.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(|e| e.value.as_str())
    }

    #[must_use]
    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Reduced projection of a `Principal` stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedPrincipal {
    pub id: String,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&Principal> for SerializedPrincipal {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id().to_string(),
            display: principal.display_name().to_string(),
            nickname: principal.nickname().map(str::to_string),
            email: principal.primary_email().map(str::to_string),
        }
    }
}

/// The user reconstructed from a session by the deserialize hook.
///
/// Serializes as exactly the fields that were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionUser {
    /// Written by the reduced projection.
    Reduced(SerializedPrincipal),
    /// Written by the full-profile projection.
    Full(Box<Principal>),
}

impl SessionUser {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Reduced(p) => &p.id,
            Self::Full(p) => p.id(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Reduced(p) => &p.display,
            Self::Full(p) => p.display_name(),
        }
    }

    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Self::Reduced(p) => p.nickname.as_deref(),
            Self::Full(p) => p.nickname(),
        }
    }

    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        match self {
            Self::Reduced(p) => p.email.as_deref(),
            Self::Full(p) => p.primary_email(),
        }
    }
}

//! Identity provider configuration.
//!
//! Holds the credentials and handshake options for the external identity
//! provider (e.g., Auth0, Keycloak, Authentik). Loaded once at startup.

use serde::{Deserialize, Serialize};

/// Configuration for the identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Provider domain (e.g., "tenant.us.auth0.com"). A full URL is also accepted.
    domain: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// Path the provider redirects back to after login.
    /// Default: "/login"
    #[serde(default = "default_callback_path")]
    callback_path: String,
    /// Scopes to request as a comma-separated string.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_callback_path() -> String {
    "/login".to_string()
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

impl IdentityConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(domain: String, client_id: String, client_secret: String) -> Self {
        Self {
            domain,
            client_id,
            client_secret,
            callback_path: default_callback_path(),
            scopes: default_scopes(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(domain: String, client_id: String, client_secret: String) -> IdentityConfigBuilder {
        IdentityConfigBuilder::new(domain, client_id, client_secret)
    }

    /// Returns the provider domain as configured.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the issuer URL used for discovery.
    ///
    /// A bare domain becomes `https://{domain}/`.
    #[must_use]
    pub fn issuer_url(&self) -> String {
        let domain = self.domain.trim();
        if domain.starts_with("https://") || domain.starts_with("http://") {
            if domain.ends_with('/') {
                domain.to_string()
            } else {
                format!("{domain}/")
            }
        } else {
            format!("https://{}/", domain.trim_end_matches('/'))
        }
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the callback path.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Builds the absolute redirect URI from the server's public URL.
    #[must_use]
    pub fn redirect_uri(&self, public_url: &str) -> String {
        format!("{}{}", public_url.trim_end_matches('/'), self.callback_path)
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.domain.trim().is_empty() {
            missing.push("identity.domain");
        }
        if self.client_id.trim().is_empty() {
            missing.push("identity.client_id");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("identity.client_secret");
        }
        missing
    }
}

/// Builder for `IdentityConfig`.
#[derive(Debug)]
pub struct IdentityConfigBuilder {
    domain: String,
    client_id: String,
    client_secret: String,
    callback_path: String,
    scopes: Vec<String>,
}

impl IdentityConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(domain: String, client_id: String, client_secret: String) -> Self {
        Self {
            domain,
            client_id,
            client_secret,
            callback_path: default_callback_path(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
        }
    }

    /// Sets the callback path.
    #[must_use]
    pub fn callback_path(mut self, path: String) -> Self {
        self.callback_path = path;
        self
    }

    /// Sets the scopes to request.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Builds the `IdentityConfig`.
    #[must_use]
    pub fn build(self) -> IdentityConfig {
        IdentityConfig {
            domain: self.domain,
            client_id: self.client_id,
            client_secret: self.client_secret,
            callback_path: self.callback_path,
            scopes: self.scopes.join(","),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig::new(
            "tenant.auth0.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = config();

        assert_eq!(config.domain(), "tenant.auth0.com");
        assert_eq!(config.client_id(), "client-id");
        assert_eq!(config.client_secret(), "client-secret");
        assert_eq!(config.callback_path(), "/login");
        assert_eq!(config.scopes(), vec!["openid", "profile", "email"]);
        assert!(config.missing_fields().is_empty());
    }

    #[test]
    fn issuer_url_from_bare_domain() {
        assert_eq!(config().issuer_url(), "https://tenant.auth0.com/");
    }

    #[test]
    fn issuer_url_keeps_explicit_scheme() {
        let config = IdentityConfig::new(
            "http://localhost:8080/realms/main".to_string(),
            "id".to_string(),
            "secret".to_string(),
        );
        assert_eq!(config.issuer_url(), "http://localhost:8080/realms/main/");
    }

    #[test]
    fn redirect_uri_joins_public_url_and_callback() {
        assert_eq!(
            config().redirect_uri("http://localhost:3000/"),
            "http://localhost:3000/login"
        );
    }

    #[test]
    fn builder_allows_customization() {
        let config = IdentityConfig::builder(
            "tenant.auth0.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        )
        .callback_path("/callback".to_string())
        .add_scope("offline_access".to_string())
        .add_scope("openid".to_string())
        .build();

        assert_eq!(config.callback_path(), "/callback");
        assert!(config.scopes().contains(&"offline_access"));
        assert_eq!(config.scopes().iter().filter(|s| **s == "openid").count(), 1);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "domain": "tenant.auth0.com",
            "client_id": "my-client",
            "client_secret": "secret",
            "scopes": "profile, openid"
        }"#;

        let config: IdentityConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.callback_path(), "/login");
        assert_eq!(config.scopes(), vec!["profile", "openid"]);
    }

    #[test]
    fn blank_credentials_are_reported_missing() {
        let config = IdentityConfig::new(" ".to_string(), String::new(), "s".to_string());

        assert_eq!(
            config.missing_fields(),
            vec!["identity.domain", "identity.client_id"]
        );
    }
}

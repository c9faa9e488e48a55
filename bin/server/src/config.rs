//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from an optional `passage.toml` and
//! environment variables (nested keys use `__`, e.g. `IDENTITY__CLIENT_ID`).
//!
//! See [`IdentityConfig`](passage_session::IdentityConfig) for identity
//! provider configuration.

use config::{Config, ConfigBuilder, builder::DefaultState};
use passage_session::{IdentityConfig, ProjectionKind};
use rootcause::prelude::Report;
use serde::Deserialize;

use crate::auth::{LOGOUT_PATH, ME_PATH};
use crate::error::ConfigError;

/// Minimum accepted length of the session signing secret, in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime: ten years.
const MAX_SESSION_AGE_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used to build the provider callback URL.
    /// Defaults to `http://localhost:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Identity provider configuration.
    pub identity: IdentityConfig,

    /// Session configuration.
    pub session: SessionConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign session cookies.
    pub secret: String,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds, also used as the cookie max-age.
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: i64,

    /// Push the expiry forward on every authenticated request.
    #[serde(default)]
    pub rolling: bool,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Which principal fields are stored in the session.
    #[serde(default)]
    pub projection: ProjectionKind,

    /// Where `/logout` sends the user.
    #[serde(default = "default_logout_redirect")]
    pub logout_redirect: String,

    /// Interval between expired-session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_port() -> u16 {
    3000
}

fn default_cookie_name() -> String {
    "passage.sid".to_string()
}

fn default_max_age_seconds() -> i64 {
    1000
}

fn default_secure_cookies() -> bool {
    true
}

fn default_logout_redirect() -> String {
    "/login".to_string()
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl SessionConfig {
    /// Creates a session configuration with defaults for everything but the secret.
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            cookie_name: default_cookie_name(),
            max_age_seconds: default_max_age_seconds(),
            rolling: false,
            secure_cookies: default_secure_cookies(),
            projection: ProjectionKind::default(),
            logout_redirect: default_logout_redirect(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }

    /// Session lifetime.
    ///
    /// Saturates for values [`ServerConfig::validate`] would reject.
    #[must_use]
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.max_age_seconds).unwrap_or(chrono::Duration::MAX)
    }
}

impl ServerConfig {
    /// Loads configuration from `passage.toml` (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        Self::from_builder(
            Config::builder()
                .add_source(config::File::with_name("passage").required(false))
                .add_source(
                    config::Environment::default()
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, Report<ConfigError>> {
        let config: Self = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigError::Load {
                details: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if let Some(field) = self.identity.missing_fields().first() {
            return Err(ConfigError::Missing {
                field: (*field).to_string(),
            }
            .into());
        }

        if self.session.secret.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "session.secret".to_string(),
            }
            .into());
        }

        if self.session.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                field: "session.secret".to_string(),
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            }
            .into());
        }

        validate_callback_path(self.identity.callback_path())?;

        if self.session.max_age_seconds <= 0 {
            return Err(ConfigError::Invalid {
                field: "session.max_age_seconds".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        if self.session.max_age_seconds > MAX_SESSION_AGE_SECONDS {
            return Err(ConfigError::Invalid {
                field: "session.max_age_seconds".to_string(),
                reason: format!("must be at most {MAX_SESSION_AGE_SECONDS}"),
            }
            .into());
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "session.cookie_name".to_string(),
                reason: "must not be blank".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Public base URL of this server.
    #[must_use]
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

/// The callback is mounted as a literal route next to `/me` and `/logout`.
fn validate_callback_path(path: &str) -> Result<(), Report<ConfigError>> {
    let invalid = |reason: &str| -> Report<ConfigError> {
        ConfigError::Invalid {
            field: "identity.callback_path".to_string(),
            reason: reason.to_string(),
        }
        .into()
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    if path == ME_PATH || path == LOGOUT_PATH {
        return Err(invalid("collides with a built-in route"));
    }

    let literal = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '~'));
    if !literal {
        return Err(invalid(
            "may only contain ASCII letters, digits, '/', '-', '_', '.', and '~'",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn load(toml: &str) -> Result<ServerConfig, Report<ConfigError>> {
        ServerConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    const MINIMAL: &str = r#"
        [identity]
        domain = "tenant.auth0.com"
        client_id = "client"
        client_secret = "shh"

        [session]
        secret = "a sufficiently long secret"
    "#;

    #[test]
    fn minimal_config_has_correct_defaults() {
        let config = load(MINIMAL).expect("load");

        assert_eq!(config.port, 3000);
        assert_eq!(config.public_url(), "http://localhost:3000");
        assert_eq!(config.identity.callback_path(), "/login");
        assert_eq!(config.session.cookie_name, "passage.sid");
        assert_eq!(config.session.max_age_seconds, 1000);
        assert!(!config.session.rolling);
        assert!(config.session.secure_cookies);
        assert_eq!(config.session.projection, ProjectionKind::Reduced);
        assert_eq!(config.session.logout_redirect, "/login");
        assert_eq!(config.session.cleanup_interval_seconds, 300);
    }

    #[test]
    fn session_config_new_matches_deserialized_defaults() {
        let built = SessionConfig::new("a sufficiently long secret".to_string());
        let loaded = load(MINIMAL).expect("load").session;

        assert_eq!(built.cookie_name, loaded.cookie_name);
        assert_eq!(built.max_age_seconds, loaded.max_age_seconds);
        assert_eq!(built.logout_redirect, loaded.logout_redirect);
        assert_eq!(built.max_age(), chrono::Duration::seconds(1000));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(
            r#"
            port = 3001
            public_url = "https://app.example.com"

            [identity]
            domain = "tenant.auth0.com"
            client_id = "client"
            client_secret = "shh"
            callback_path = "/callback"

            [session]
            secret = "a sufficiently long secret"
            max_age_seconds = 60
            rolling = true
            secure_cookies = false
            projection = "full"
            "#,
        )
        .expect("load");

        assert_eq!(config.port, 3001);
        assert_eq!(config.public_url(), "https://app.example.com");
        assert_eq!(config.identity.callback_path(), "/callback");
        assert_eq!(config.session.max_age_seconds, 60);
        assert!(config.session.rolling);
        assert!(!config.session.secure_cookies);
        assert_eq!(config.session.projection, ProjectionKind::Full);
    }

    #[test]
    fn missing_identity_section_fails() {
        let result = load(
            r#"
            [session]
            secret = "a sufficiently long secret"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_client_secret_fails_validation() {
        let result = load(&MINIMAL.replace(r#"client_secret = "shh""#, r#"client_secret = """#));
        assert!(result.is_err());
    }

    #[test]
    fn short_session_secret_fails_validation() {
        let result = load(&MINIMAL.replace("a sufficiently long secret", "short"));
        assert!(result.is_err());
    }

    #[test]
    fn relative_callback_path_fails_validation() {
        let result = load(&format!(
            "{}\n",
            MINIMAL.replace(
                r#"client_secret = "shh""#,
                "client_secret = \"shh\"\ncallback_path = \"callback\""
            )
        ));
        assert!(result.is_err());
    }

    fn with_callback_path(path: &str) -> String {
        MINIMAL.replace(
            r#"client_secret = "shh""#,
            &format!("client_secret = \"shh\"\ncallback_path = \"{path}\""),
        )
    }

    #[test]
    fn oversized_max_age_fails_validation() {
        let result = load(&MINIMAL.replace(
            r#"secret = "a sufficiently long secret""#,
            "secret = \"a sufficiently long secret\"\nmax_age_seconds = 100000000000000",
        ));

        let err = result.expect_err("oversized max age");
        assert!(matches!(
            err.current_context(),
            ConfigError::Invalid { field, .. } if field == "session.max_age_seconds"
        ));
    }

    #[test]
    fn ten_year_max_age_is_accepted() {
        let config = load(&MINIMAL.replace(
            r#"secret = "a sufficiently long secret""#,
            "secret = \"a sufficiently long secret\"\nmax_age_seconds = 315360000",
        ))
        .expect("load");
        assert_eq!(config.session.max_age(), chrono::Duration::days(3650));
    }

    #[test]
    fn max_age_saturates_instead_of_panicking() {
        let mut session = SessionConfig::new("a sufficiently long secret".to_string());
        session.max_age_seconds = i64::MAX;
        assert_eq!(session.max_age(), chrono::Duration::MAX);
    }

    #[test]
    fn callback_path_colliding_with_routes_fails_validation() {
        let err = load(&with_callback_path("/me")).expect_err("collides with /me");
        assert!(matches!(
            err.current_context(),
            ConfigError::Invalid { field, .. } if field == "identity.callback_path"
        ));
        assert!(load(&with_callback_path("/logout")).is_err());
    }

    #[test]
    fn callback_path_with_route_syntax_fails_validation() {
        assert!(load(&with_callback_path("/{x")).is_err());
        assert!(load(&with_callback_path("/*rest")).is_err());
        assert!(load(&with_callback_path("/:id")).is_err());
    }

    #[test]
    fn nested_callback_path_is_accepted() {
        let config = load(&with_callback_path("/auth/callback")).expect("load");
        assert_eq!(config.identity.callback_path(), "/auth/callback");
    }
}

//! Authentication module for the passage server.
//!
//! This module provides:
//! - OIDC authentication with an external identity provider
//! - The auth gate middleware attaching an `AuthContext` to every request
//! - Extractors for handlers that need the current user
//! - The `/login`, `/logout`, and `/me` routes
//!
//! Session storage and the serialize/deserialize hooks live in
//! `passage_session`; this module only moves their results in and out of
//! HTTP.

pub mod cookies;
pub mod middleware;
pub mod oidc;
pub mod routes;

use crate::config::SessionConfig;
use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use passage_session::{AuthGate, IdentityStrategy};
use std::sync::Arc;

pub use middleware::{AuthRejection, CurrentUser, RequestContext, auth_gate};
pub use oidc::OidcStrategy;
pub use routes::{login, logout, me};

/// Path of the login entry point.
pub const LOGIN_PATH: &str = "/login";

/// Path of the protected profile route.
pub const ME_PATH: &str = "/me";

pub const LOGOUT_PATH: &str = "/logout";

/// Shared application state.
pub struct AppState {
    /// Resolves and writes sessions.
    pub gate: AuthGate,
    /// Provider handshake.
    pub strategy: Arc<dyn IdentityStrategy>,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        gate: AuthGate,
        strategy: Arc<dyn IdentityStrategy>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            gate,
            strategy,
            session_config,
        }
    }
}

/// A `302 Found` redirect to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

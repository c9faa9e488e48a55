//! Shared helpers for driving the router without a network or a real provider.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use passage_server::{app, auth::AppState, config::SessionConfig};
use passage_session::strategy::verify;
use passage_session::{
    CallbackParams, HandshakeError, HandshakeStart, HandshakeState, IdentityStrategy, Principal,
    ProviderProfile, ProviderTokens,
};
use rootcause::prelude::Report;
use std::sync::Arc;
use tower::ServiceExt;

pub const AUTHORIZE_URL: &str = "https://id.example.com/authorize?client_id=test-client";
pub const SESSION_COOKIE: &str = "passage.sid";

/// Code the fake provider accepts.
pub const GOOD_CODE: &str = "good";

/// Identity strategy that signs in Ada for [`GOOD_CODE`] and fails otherwise.
pub struct FakeStrategy;

impl FakeStrategy {
    pub fn state() -> HandshakeState {
        HandshakeState {
            csrf_token: "csrf".to_string(),
            pkce_verifier: "verifier".to_string(),
            nonce: "nonce".to_string(),
        }
    }
}

#[async_trait]
impl IdentityStrategy for FakeStrategy {
    fn begin_handshake(&self) -> HandshakeStart {
        HandshakeStart {
            authorization_url: AUTHORIZE_URL.to_string(),
            state: Self::state(),
        }
    }

    async fn complete_handshake(
        &self,
        callback: &CallbackParams,
        state: &HandshakeState,
    ) -> Result<Principal, Report<HandshakeError>> {
        let code = callback.authorization_code()?;
        if state.nonce != Self::state().nonce {
            return Err(HandshakeError::TokenValidation {
                reason: "nonce mismatch".to_string(),
            }
            .into());
        }
        if code != GOOD_CODE {
            return Err(HandshakeError::TokenExchange {
                reason: "invalid_grant".to_string(),
            }
            .into());
        }

        verify(
            ProviderTokens {
                access_token: "access".to_string(),
                ..ProviderTokens::default()
            },
            ProviderProfile {
                subject: "auth0|123".to_string(),
                name: Some("Ada Lovelace".to_string()),
                nickname: Some("ada".to_string()),
                email: Some("ada@example.com".to_string()),
                email_verified: Some(true),
                picture: None,
                provider: "https://id.example.com/".to_string(),
            },
        )
    }
}

/// Session config suitable for plain-HTTP tests.
pub fn session_config() -> SessionConfig {
    let mut config = SessionConfig::new("integration test secret".to_string());
    config.secure_cookies = false;
    config
}

pub fn state_with(config: SessionConfig) -> Arc<AppState> {
    app::build_state(config, Arc::new(FakeStrategy))
}

pub fn router_with(state: Arc<AppState>) -> Router {
    app::router(state, "/login")
}

pub fn test_app() -> Router {
    router_with(state_with(session_config()))
}

/// Sends a GET, optionally carrying a `Cookie` header.
pub async fn get(app: &Router, uri: &str, cookies: &[(&str, &str)]) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if !cookies.is_empty() {
        let header_value = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        request = request.header(header::COOKIE, header_value);
    }

    app.clone()
        .oneshot(request.body(Body::empty()).expect("request"))
        .await
        .expect("infallible")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
}

/// Value of the `Set-Cookie` for `name`, if the response sets one.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(cookie_name, _)| cookie_name.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Runs a full successful login and returns the session credential.
pub async fn sign_in(app: &Router) -> String {
    let start = get(app, "/login", &[]).await;
    let handshake = set_cookie(&start, "passage.handshake").expect("handshake cookie");

    let callback = get(
        app,
        &format!("/login?code={GOOD_CODE}&state=csrf"),
        &[("passage.handshake", &handshake)],
    )
    .await;
    set_cookie(&callback, SESSION_COOKIE).expect("session cookie")
}

//! Authentication routes for login, callback, logout, and the profile route.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use passage_session::{
    CallbackParams, HandshakeError, HandshakeState, IssuedSession, SessionError, SessionUser,
};
use rootcause::prelude::Report;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    AppState, LOGIN_PATH, ME_PATH,
    cookies::{self, FLASH_COOKIE, HANDSHAKE_COOKIE},
    found,
    middleware::CurrentUser,
};

/// Starts a login, or completes one when the provider redirects back here.
///
/// Without `code`/`error` parameters this redirects to the provider. With
/// them it is the provider callback: success lands on `/me`, any failure
/// lands back on `/login` with a flash code.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    if params.is_callback() {
        complete_login(&state, &params, jar).await
    } else {
        begin_login(&state, jar)
    }
}

fn begin_login(state: &AppState, mut jar: CookieJar) -> Response {
    if let Some(flash) = jar.get(FLASH_COOKIE) {
        info!(flash = %flash.value(), "Restarting login after a failed attempt");
        jar = jar.add(cookies::removal(FLASH_COOKIE));
    }

    let start = state.strategy.begin_handshake();
    let jar = jar.add(cookies::handshake(&state.session_config, &start.state));

    (jar, found(&start.authorization_url)).into_response()
}

async fn complete_login(state: &AppState, params: &CallbackParams, jar: CookieJar) -> Response {
    let clear_handshake = cookies::removal(HANDSHAKE_COOKIE);

    match finish_handshake(state, params, &jar).await {
        Ok(issued) => {
            info!(expires_at = %issued.expires_at(), "Login completed");
            let jar = jar
                .add(cookies::session(&state.session_config, &issued))
                .add(clear_handshake);
            (jar, found(ME_PATH)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "Login failed");
            let jar = jar
                .add(clear_handshake)
                .add(cookies::flash(&state.session_config, err.flash_code()));
            (jar, found(LOGIN_PATH)).into_response()
        }
    }
}

async fn finish_handshake(
    state: &AppState,
    params: &CallbackParams,
    jar: &CookieJar,
) -> Result<IssuedSession, LoginError> {
    let handshake_state = match jar.get(HANDSHAKE_COOKIE) {
        Some(cookie) => HandshakeState::decode(cookie.value()).map_err(LoginError::Handshake)?,
        // A provider-side rejection is more useful to report than the missing state.
        None => {
            params.authorization_code().map_err(LoginError::Handshake)?;
            return Err(LoginError::Handshake(HandshakeError::MissingState.into()));
        }
    };

    let principal = state
        .strategy
        .complete_handshake(params, &handshake_state)
        .await
        .map_err(LoginError::Handshake)?;

    let previous = jar
        .get(&state.session_config.cookie_name)
        .map(|c| c.value().to_owned());

    state
        .gate
        .establish(&principal, previous.as_deref())
        .await
        .map_err(LoginError::Session)
}

/// Returns the current user as JSON, or redirects to `/login`.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<SessionUser> {
    Json(user)
}

/// Invalidates the session and clears the session cookie.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let cookie_name = state.session_config.cookie_name.clone();

    if let Some(cookie) = jar.get(&cookie_name) {
        match state.gate.invalidate(cookie.value()).await {
            Ok(removed) => debug!(removed, "Logged out"),
            Err(e) => warn!(error = %e, "Failed to invalidate session on logout"),
        }
    }

    let jar = jar.add(cookies::removal(cookie_name));
    (jar, found(&state.session_config.logout_redirect)).into_response()
}

/// Why a callback did not produce a session.
#[derive(Debug)]
enum LoginError {
    Handshake(Report<HandshakeError>),
    Session(Report<SessionError>),
}

impl LoginError {
    fn flash_code(&self) -> &'static str {
        match self {
            Self::Handshake(report) => report.current_context().flash_code(),
            Self::Session(_) => "session_unavailable",
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake(report) => write!(f, "{report}"),
            Self::Session(report) => write!(f, "{report}"),
        }
    }
}

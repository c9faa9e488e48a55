//! Cookie construction for the session, handshake, and flash cookies.

use axum::http::{HeaderMap, header::SET_COOKIE};
use axum_extra::extract::cookie::{Cookie, SameSite};
use passage_session::{HandshakeState, IssuedSession};
use time::Duration as TimeDuration;

use crate::config::SessionConfig;

/// Carries PKCE/nonce state between `/login` and the callback.
pub const HANDSHAKE_COOKIE: &str = "passage.handshake";

/// Carries a failure code back to `/login` after a failed callback.
pub const FLASH_COOKIE: &str = "passage.flash";

/// The session credential cookie.
pub fn session(config: &SessionConfig, issued: &IssuedSession) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), issued.credential().to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(issued.max_age().num_seconds()))
        .build()
}

/// Short-lived cookie holding the handshake state.
pub fn handshake(config: &SessionConfig, state: &HandshakeState) -> Cookie<'static> {
    Cookie::build((HANDSHAKE_COOKIE, state.encode()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10))
        .build()
}

/// One-shot failure message for the next `/login`.
pub fn flash(config: &SessionConfig, code: &str) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, code.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(1))
        .build()
}

/// A cookie that tells the client to drop `name`.
pub fn removal(name: impl Into<String>) -> Cookie<'static> {
    Cookie::build((name.into(), ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Returns true if `headers` already set a cookie called `name`.
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .ok()
            .and_then(|v| v.split_once('='))
            .is_some_and(|(cookie_name, _)| cookie_name.trim() == name)
    })
}

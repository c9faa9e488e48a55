//! Auth gate middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use passage_session::{AuthContext, CredentialAction, SessionUser};
use std::sync::Arc;

use super::{AppState, LOGIN_PATH, cookies, found};

/// Resolves the session credential and attaches an [`AuthContext`] to the
/// request before any handler runs.
///
/// Afterwards the context's credential action is applied to the response,
/// unless the handler already set the session cookie itself.
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.session_config.cookie_name.as_str();
    let jar = CookieJar::from_headers(request.headers());
    let credential = jar.get(cookie_name).map(|c| c.value().to_owned());

    let context = state.gate.resolve(credential.as_deref()).await;
    let action = context.credential_action().clone();
    request.extensions_mut().insert(context);

    let response = next.run(request).await;
    if cookies::sets_cookie(response.headers(), cookie_name) {
        return response;
    }

    match action {
        CredentialAction::Keep => response,
        CredentialAction::Renew(issued) => (
            CookieJar::new().add(cookies::session(&state.session_config, &issued)),
            response,
        )
            .into_response(),
        CredentialAction::Clear => (
            CookieJar::new().add(cookies::removal(cookie_name.to_owned())),
            response,
        )
            .into_response(),
    }
}

/// Extractor for the request's authentication context.
///
/// Never rejects an anonymous request; use [`CurrentUser`] for that.
pub struct RequestContext(pub AuthContext);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(RequestContext)
            .ok_or(AuthRejection::GateMissing)
    }
}

/// Extractor for requiring an authenticated user.
///
/// If the user is not authenticated, they will be redirected to the login page.
pub struct CurrentUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequestContext(context) = RequestContext::from_request_parts(parts, state).await?;
        context
            .user()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    /// The router was built without the `auth_gate` layer.
    GateMissing,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => found(LOGIN_PATH),
            Self::GateMissing => {
                tracing::error!("Auth context requested on a route without the auth gate");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

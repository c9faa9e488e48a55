//! Router assembly.

use axum::{Router, middleware, routing::get};
use passage_session::{AuthGate, IdentityStrategy, MemorySessionStore, SessionSecret};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, LOGIN_PATH, LOGOUT_PATH, ME_PATH};
use crate::config::SessionConfig;

/// Builds the application state with an in-memory session store.
pub fn build_state(
    session_config: SessionConfig,
    strategy: Arc<dyn IdentityStrategy>,
) -> Arc<AppState> {
    let gate = AuthGate::new(
        Arc::new(MemorySessionStore::new()),
        session_config.projection.build(),
        SessionSecret::new(session_config.secret.clone()),
        session_config.max_age(),
    )
    .with_rolling(session_config.rolling);

    Arc::new(AppState::new(gate, strategy, session_config))
}

/// Builds the router. Every route runs behind the auth gate.
pub fn router(state: Arc<AppState>, callback_path: &str) -> Router {
    let mut router = Router::new()
        .route(LOGIN_PATH, get(auth::login))
        .route(ME_PATH, get(auth::me))
        .route(LOGOUT_PATH, get(auth::logout));

    if callback_path != LOGIN_PATH {
        router = router.route(callback_path, get(auth::login));
    }

    router
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

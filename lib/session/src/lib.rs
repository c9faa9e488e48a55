//! Session and identity primitives for passage.
//!
//! This crate provides:
//! - The normalized identity record (`Principal`)
//! - Serialize/deserialize hooks controlling what enters a session (`PrincipalProjection`)
//! - Session records and the `SessionStore` abstraction with an in-memory backend
//! - Signed session credentials
//! - The `AuthGate`, which resolves a request's credential into an `AuthContext`
//! - The `IdentityStrategy` abstraction for provider handshakes
//!
//! Nothing here depends on a web framework; the server crate wires these
//! pieces into HTTP.
//!
//! # Example
//!
//! ```
//! use passage_session::{
//!     AuthGate, EmailClaim, MemorySessionStore, Principal, ReducedProjection, SessionSecret,
//! };
//! use chrono::Duration;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let gate = AuthGate::new(
//!     Arc::new(MemorySessionStore::new()),
//!     Arc::new(ReducedProjection),
//!     SessionSecret::new("an example session secret".to_string()),
//!     Duration::minutes(15),
//! );
//!
//! let principal = Principal::new("auth0|123".to_string(), "Ada Lovelace".to_string())
//!     .with_nickname(Some("ada".to_string()))
//!     .with_emails(vec![EmailClaim::new("ada@example.com".to_string())]);
//!
//! let issued = gate.establish(&principal, None).await.expect("establish");
//! let context = gate.resolve(Some(issued.credential())).await;
//! assert_eq!(context.user().map(|u| u.id()), Some("auth0|123"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod gate;
pub mod identity;
pub mod principal;
pub mod projection;
pub mod session;
pub mod store;
pub mod strategy;
pub mod token;

// Re-export main types at crate root
pub use error::{HandshakeError, SessionError};
pub use gate::{AuthContext, AuthGate, CredentialAction, IssuedSession};
pub use identity::{IdentityConfig, IdentityConfigBuilder};
pub use principal::{EmailClaim, Principal, SerializedPrincipal, SessionUser};
pub use projection::{FullProfileProjection, PrincipalProjection, ProjectionKind, ReducedProjection};
pub use session::{Session, SessionId};
pub use store::{MemorySessionStore, SessionStore};
pub use strategy::{
    CallbackParams, HandshakeStart, HandshakeState, IdentityStrategy, ProviderProfile,
    ProviderTokens,
};
pub use token::SessionSecret;

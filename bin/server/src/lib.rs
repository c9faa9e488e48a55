//! passage web server.
//!
//! Signs users in through an external identity provider, keeps a projection
//! of their profile in a server-side session, and serves it back on `/me`.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;

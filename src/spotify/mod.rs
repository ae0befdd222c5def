//! # Spotify Integration Module
//!
//! Server-side access to the two Spotify services the proxy talks to:
//!
//! - [`auth`] - the accounts service: authorization-code exchange, refresh
//!   grants and the consent URL. Holds the confidential client credentials.
//! - [`resources`] - the Web API: bearer-token GETs for listening history,
//!   top lists, saved tracks and audio features.
//!
//! ```text
//! HTTP handlers / CLI
//!          ↓
//! TokenExchange ── POST form ──→ accounts.spotify.com/api/token
//! ResourceProxy ── GET bearer ──→ api.spotify.com/v1/...
//! ```
//!
//! Both services are cheap to clone: they share one `reqwest::Client` and
//! immutable configuration, and keep no per-user state. The token of the
//! user a call is made for always arrives as an explicit
//! [`Session`](crate::session::Session).
//!
//! Nothing here retries. A failed call is reported once, as a
//! [`ProxyError`](crate::error::ProxyError), and retrying is up to the
//! caller.

pub mod auth;
pub mod resources;

pub use auth::TokenExchange;
pub use resources::{ResourceParams, ResourceProxy, ResourceRequest};

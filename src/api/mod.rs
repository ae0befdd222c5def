//! # API Module
//!
//! HTTP handlers of the Predictify proxy. Each handler is a thin adapter:
//! it validates the inbound shape, builds an explicit
//! [`Session`](crate::session::Session) where a token is involved and hands
//! off to the matching service from [`AppState`](crate::server::AppState).
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`token_exchange`] - `POST /tokenExchange`, authorization code → token pair
//! - [`token_refresh`] - `POST /tokenRefresh`, refresh token → token pair
//! - [`login`] - `GET /login`, redirect to the provider's consent page
//! - [`callback`] - `GET /callback`, completes a login started by the CLI
//!
//! ### Proxies
//!
//! - [`resource`] - `POST /resource`, Spotify Web API relay
//! - [`recommend`] - `POST /recommend`, direct or feature-target recommendations
//! - [`search`], [`recommendations`], [`song`] - `GET /songs/...`, catalog relay
//!
//! ### Monitoring
//!
//! - [`health`] - `GET /health`, status and version
//!
//! ## Errors
//!
//! Handlers return `Result<_, ProxyError>`; the error renders as
//! `{ "error": ..., "details"?: ... }` with the status chosen by
//! [`ProxyError::status`](crate::error::ProxyError::status). Upstream
//! bodies are never part of a reply.

mod callback;
mod health;
mod login;
mod recommend;
mod resource;
mod songs;
mod token;

pub use callback::callback;
pub use health::health;
pub use login::login;
pub use recommend::recommend;
pub use resource::{ResourceBody, resource};
pub use songs::{recommendations, search, song};
pub use token::{TokenExchangeBody, TokenRefreshBody, token_exchange, token_refresh};

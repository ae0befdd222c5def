//! Error taxonomy shared by every proxy.
//!
//! Client input errors are rejected before any network call. Upstream and
//! transport failures carry the [`Service`] they came from so the HTTP layer
//! can report them uniformly as `{ "error": ..., "details"?: ... }` without
//! ever echoing an upstream body back to the caller.

use std::fmt;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// The upstream a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    IdentityProvider,
    ResourceApi,
    MlBackend,
    Catalog,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::IdentityProvider => "identity provider",
            Service::ResourceApi => "Spotify API",
            Service::MlBackend => "recommendation backend",
            Service::Catalog => "song catalog backend",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Rejected before any upstream call.
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream answered with a non-success status. `message` is safe to show
    /// to the caller; the raw upstream body is only ever logged.
    #[error("{message}")]
    Upstream {
        service: Service,
        status: StatusCode,
        message: String,
    },

    /// Connection refused or name resolution failed.
    #[error("{service} is not running")]
    Unreachable { service: Service },

    /// Upstream answered 2xx without a body.
    #[error("Empty response from {service}")]
    EmptyBody { service: Service },

    /// Upstream body was not the JSON shape we expected.
    #[error("Invalid response from {service}")]
    InvalidPayload { service: Service, reason: String },

    /// Any other transport failure (timeout, TLS, reset connection).
    #[error("Failed to reach {service}")]
    Transport { service: Service, reason: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProxyError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ProxyError::InvalidInput(message.into())
    }

    /// Classifies a `reqwest` failure.
    ///
    /// Connection-level failures become [`ProxyError::Unreachable`] so callers
    /// can tell a stopped backend apart from one that misbehaves.
    pub fn from_transport(service: Service, err: reqwest::Error) -> Self {
        if err.is_connect() {
            ProxyError::Unreachable { service }
        } else if err.is_decode() {
            ProxyError::InvalidPayload {
                service,
                reason: err.to_string(),
            }
        } else {
            ProxyError::Transport {
                service,
                reason: err.to_string(),
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Unreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::EmptyBody { .. } | ProxyError::InvalidPayload { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn service(&self) -> Option<Service> {
        match self {
            ProxyError::InvalidInput(_) => None,
            ProxyError::Upstream { service, .. }
            | ProxyError::Unreachable { service }
            | ProxyError::EmptyBody { service }
            | ProxyError::InvalidPayload { service, .. }
            | ProxyError::Transport { service, .. } => Some(*service),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, ProxyError::InvalidInput(_))
    }

    pub fn body(&self) -> ErrorBody {
        let details = match self {
            ProxyError::Unreachable { service } => Some(format!(
                "Please ensure the {service} is started at its configured address"
            )),
            _ => None,
        };

        ErrorBody {
            error: self.to_string(),
            details,
        }
    }
}

// A body that does not fit the route is a client error like any other.
impl From<JsonRejection> for ProxyError {
    fn from(rejection: JsonRejection) -> Self {
        ProxyError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Parses an upstream body that was already read as text.
///
/// An empty or whitespace-only body is a distinct failure: it is reported as
/// [`ProxyError::EmptyBody`] before any JSON parsing is attempted.
pub fn parse_body<T>(service: Service, text: &str) -> Result<T, ProxyError>
where
    T: serde::de::DeserializeOwned,
{
    if text.trim().is_empty() {
        return Err(ProxyError::EmptyBody { service });
    }

    serde_json::from_str(text).map_err(|e| ProxyError::InvalidPayload {
        service,
        reason: e.to_string(),
    })
}

use axum::{Extension, Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use tracing::warn;

use crate::{error::ProxyError, server::AppState, types::TokenPair};

#[derive(Debug, Default, Deserialize)]
pub struct TokenExchangeBody {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRefreshBody {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub async fn token_exchange(
    Extension(state): Extension<AppState>,
    body: Result<Json<TokenExchangeBody>, JsonRejection>,
) -> Result<Json<TokenPair>, ProxyError> {
    let Json(body) = body?;
    let code = body.code.unwrap_or_default();
    state
        .tokens
        .exchange(&code)
        .await
        .inspect_err(|e| warn!(status = %e.status(), error = %e, "token exchange failed"))
        .map(Json)
}

pub async fn token_refresh(
    Extension(state): Extension<AppState>,
    body: Result<Json<TokenRefreshBody>, JsonRejection>,
) -> Result<Json<TokenPair>, ProxyError> {
    let Json(body) = body?;
    let refresh_token = body.refresh_token.unwrap_or_default();
    state
        .tokens
        .refresh(&refresh_token)
        .await
        .inspect_err(|e| warn!(status = %e.status(), error = %e, "token refresh failed"))
        .map(Json)
}

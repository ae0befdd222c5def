use axum::{Extension, Json, extract::rejection::JsonRejection};
use serde_json::Value;
use tracing::warn;

use crate::{error::ProxyError, recommend::RecommendPayload, server::AppState};

pub async fn recommend(
    Extension(state): Extension<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(body) = body?;
    let payload = RecommendPayload::from_value(body)?;

    state
        .recommender
        .recommend(payload)
        .await
        .inspect_err(|e| warn!(service = ?e.service(), error = %e, "recommendation failed"))
        .map(Json)
}

use axum::{Extension, Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    error::ProxyError, server::AppState, session::Session, spotify::ResourceRequest,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub track_ids: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub time_range: Option<String>,
}

pub async fn resource(
    Extension(state): Extension<AppState>,
    body: Result<Json<ResourceBody>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(body) = body?;
    let request = ResourceRequest::parse(
        &body.kind,
        body.track_ids,
        body.limit,
        body.time_range.as_deref(),
    )?;
    let session = Session::from_access_token(body.token);

    state
        .resources
        .fetch(&session, &request)
        .await
        .inspect_err(|e| {
            warn!(kind = %request.kind(), service = ?e.service(), error = %e, "resource request failed")
        })
        .map(Json)
}

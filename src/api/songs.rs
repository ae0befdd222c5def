use axum::{
    Extension, Json,
    extract::{Path, Query},
};
use serde::Deserialize;

use crate::{
    error::ProxyError,
    server::AppState,
    types::{Song, SongQueryResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn search(
    Extension(state): Extension<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SongQueryResult>, ProxyError> {
    state
        .catalog
        .search_songs(&params.q, params.limit)
        .await
        .map(Json)
}

pub async fn recommendations(
    Extension(state): Extension<AppState>,
    Path(track_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<SongQueryResult>, ProxyError> {
    state
        .catalog
        .recommendations_for(&track_id, params.limit)
        .await
        .map(Json)
}

pub async fn song(
    Extension(state): Extension<AppState>,
    Path(track_id): Path<String>,
) -> Result<Json<Song>, ProxyError> {
    state.catalog.get_song(&track_id).await.map(Json)
}

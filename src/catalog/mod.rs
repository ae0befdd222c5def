//! Song-catalog search proxy.
//!
//! Forwards free-text search, per-track recommendations and song lookups to
//! the catalog backend under `/api/songs`. Songs are relayed with their
//! audio features resolved, so consumers never have to reconcile the flat
//! and nested feature shapes themselves.

mod search_box;

pub use search_box::{DEBOUNCE, MIN_QUERY_LEN, SearchBox};

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    error::{ProxyError, Service, parse_body},
    types::{Song, SongQueryResult},
};

/// Anything that can answer a free-text song query.
#[async_trait]
pub trait SongSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<SongQueryResult, ProxyError>;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        CatalogClient {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn search_songs(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<SongQueryResult, ProxyError> {
        if query.trim().is_empty() {
            return Err(ProxyError::invalid("Search query must not be empty"));
        }

        let mut url = self.songs_url(&["search"])?;
        url.query_pairs_mut().append_pair("q", query);
        append_limit(&mut url, limit);

        let result: SongQueryResult = self.get(url, |_| "Failed to fetch songs").await?;
        Ok(result.with_resolved_features())
    }

    pub async fn recommendations_for(
        &self,
        track_id: &str,
        limit: Option<u32>,
    ) -> Result<SongQueryResult, ProxyError> {
        let mut url = self.songs_url(&["recommendations", non_blank(track_id)?])?;
        append_limit(&mut url, limit);

        let result: SongQueryResult = self
            .get(url, |status| {
                if status == StatusCode::NOT_FOUND {
                    "Recommendations not found"
                } else {
                    "Failed to fetch recommendations"
                }
            })
            .await?;
        Ok(result.with_resolved_features())
    }

    pub async fn get_song(&self, track_id: &str) -> Result<Song, ProxyError> {
        let url = self.songs_url(&[non_blank(track_id)?])?;
        let song: Song = self.get(url, |_| "Failed to fetch song").await?;
        Ok(song.with_resolved_features())
    }

    fn songs_url(&self, segments: &[&str]) -> Result<Url, ProxyError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ProxyError::Transport {
            service: Service::Catalog,
            reason: format!("invalid catalog url: {e}"),
        })?;

        url.path_segments_mut()
            .map_err(|_| ProxyError::Transport {
                service: Service::Catalog,
                reason: "catalog url cannot be a base".into(),
            })?
            .pop_if_empty()
            .extend(["api", "songs"])
            .extend(segments);
        Ok(url)
    }

    /// GET with the catalog's error convention: a non-2xx body may carry a
    /// JSON `detail` message, otherwise `fallback` picks a generic one.
    async fn get<T, F>(&self, url: Url, fallback: F) -> Result<T, ProxyError>
    where
        T: DeserializeOwned,
        F: Fn(StatusCode) -> &'static str,
    {
        debug!(path = url.path(), "forwarding to catalog");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProxyError::from_transport(Service::Catalog, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProxyError::from_transport(Service::Catalog, e))?;

        if !status.is_success() {
            error!(%status, path = url.path(), body = %text, "catalog backend error");
            return Err(ProxyError::Upstream {
                service: Service::Catalog,
                status,
                message: detail_message(&text).unwrap_or_else(|| fallback(status).to_string()),
            });
        }

        parse_body(Service::Catalog, &text)
    }
}

#[async_trait]
impl SongSearch for CatalogClient {
    async fn search(&self, query: &str) -> Result<SongQueryResult, ProxyError> {
        self.search_songs(query, None).await
    }
}

/// Extracts the `detail` string of an error body, if it is JSON and has one.
pub fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        _ => None,
    }
}

fn append_limit(url: &mut Url, limit: Option<u32>) {
    if let Some(limit) = limit {
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
    }
}

fn non_blank(track_id: &str) -> Result<&str, ProxyError> {
    if track_id.trim().is_empty() {
        Err(ProxyError::invalid("Track id must not be empty"))
    } else {
        Ok(track_id)
    }
}

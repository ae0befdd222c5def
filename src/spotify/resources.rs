use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    error::{ProxyError, Service, parse_body},
    session::Session,
    types::{AudioFeatureVector, ResourceKind, ResourcePayload, TimeRange},
};

/// Optional paging/window parameters passed through to list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceParams {
    pub limit: Option<u32>,
    pub time_range: Option<TimeRange>,
}

/// A validated resource request. Construction is the only place where kind
/// and arguments are checked, so an instance can always be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    kind: ResourceKind,
    track_ids: Vec<String>,
    params: ResourceParams,
}

impl ResourceRequest {
    pub fn new(kind: ResourceKind) -> Result<Self, ProxyError> {
        Self::build(kind, Vec::new(), ResourceParams::default())
    }

    pub fn audio_features(track_ids: Vec<String>) -> Result<Self, ProxyError> {
        Self::build(ResourceKind::AudioFeatures, track_ids, ResourceParams::default())
    }

    /// Validates a request as it arrives from a caller.
    ///
    /// `kind` must name one of the enumerated resources and
    /// `audioFeatures` needs at least one track id.
    pub fn parse(
        kind: &str,
        track_ids: Option<Vec<String>>,
        limit: Option<u32>,
        time_range: Option<&str>,
    ) -> Result<Self, ProxyError> {
        let kind: ResourceKind = kind
            .parse()
            .map_err(|_| ProxyError::invalid("Invalid type"))?;

        let time_range = match time_range {
            Some(raw) => Some(
                raw.parse::<TimeRange>()
                    .map_err(|_| ProxyError::invalid(format!("Invalid time range: {raw}")))?,
            ),
            None => None,
        };

        Self::build(
            kind,
            track_ids.unwrap_or_default(),
            ResourceParams { limit, time_range },
        )
    }

    pub fn with_params(self, params: ResourceParams) -> Result<Self, ProxyError> {
        Self::build(self.kind, self.track_ids, params)
    }

    fn build(
        kind: ResourceKind,
        track_ids: Vec<String>,
        params: ResourceParams,
    ) -> Result<Self, ProxyError> {
        if kind == ResourceKind::AudioFeatures {
            if track_ids.is_empty() || track_ids.iter().any(|id| id.trim().is_empty()) {
                return Err(ProxyError::invalid(
                    "audioFeatures requires a non-empty list of track ids",
                ));
            }
        } else if !track_ids.is_empty() {
            debug!(%kind, "ignoring track ids for list resource");
        }

        if params.time_range.is_some() && !kind.is_top_list() {
            return Err(ProxyError::invalid(format!(
                "time range is not supported for {kind}"
            )));
        }

        let track_ids = if kind == ResourceKind::AudioFeatures {
            track_ids
        } else {
            Vec::new()
        };

        Ok(ResourceRequest {
            kind,
            track_ids,
            params,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn track_ids(&self) -> &[String] {
        &self.track_ids
    }

    /// Query parameters in the order they are sent upstream.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if self.kind == ResourceKind::AudioFeatures {
            query.push(("ids", self.track_ids.join(",")));
        }
        if let Some(limit) = self.params.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(range) = self.params.time_range {
            query.push(("time_range", range.as_str().to_string()));
        }
        query
    }
}

/// Bearer-token relay for the Spotify Web API.
#[derive(Debug, Clone)]
pub struct ResourceProxy {
    client: Client,
    api_url: String,
}

impl ResourceProxy {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        ResourceProxy {
            client,
            api_url: api_url.into(),
        }
    }

    /// Fetches one resource on behalf of the session's user.
    ///
    /// Returns the upstream `items` array when the payload is paged and the
    /// payload itself otherwise. Order and fields are preserved exactly.
    ///
    /// # Errors
    ///
    /// A blank token is a client error and is rejected without a request.
    /// Any non-2xx reply maps to a 500 `Spotify API error`; transport and
    /// body failures map to the matching [`ProxyError`] variant.
    pub async fn fetch(
        &self,
        session: &Session,
        request: &ResourceRequest,
    ) -> Result<Value, ProxyError> {
        if session.access_token().trim().is_empty() {
            return Err(ProxyError::invalid("Missing access token"));
        }

        let url = format!("{}{}", self.api_url, request.kind().path());
        debug!(kind = %request.kind(), "fetching resource");

        let payload = self.get_json(session, &url, &request.query()).await?;
        Ok(ResourcePayload::classify(payload).into_relayed())
    }

    /// Fetches audio features and pairs them with the requested ids by
    /// position. A `null` entry (unknown track) yields the zero vector.
    pub async fn audio_features_by_id(
        &self,
        session: &Session,
        track_ids: Vec<String>,
    ) -> Result<Vec<(String, AudioFeatureVector)>, ProxyError> {
        let request = ResourceRequest::audio_features(track_ids)?;
        let payload = self.fetch(session, &request).await?;

        let features = match payload.get("audio_features") {
            Some(Value::Array(entries)) => entries.clone(),
            _ => {
                return Err(ProxyError::InvalidPayload {
                    service: Service::ResourceApi,
                    reason: "missing audio_features array".into(),
                });
            }
        };

        if features.len() != request.track_ids().len() {
            warn!(
                requested = request.track_ids().len(),
                returned = features.len(),
                "audio feature count does not match request"
            );
        }

        Ok(request
            .track_ids()
            .iter()
            .zip(features)
            .map(|(id, entry)| {
                let vector = serde_json::from_value(entry).unwrap_or_default();
                (id.clone(), vector)
            })
            .collect())
    }

    /// Shared bearer GET used by the resource and recommendation proxies.
    pub(crate) async fn get_json<Q>(
        &self,
        session: &Session,
        url: &str,
        query: &Q,
    ) -> Result<Value, ProxyError>
    where
        Q: serde::Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .get(url)
            .bearer_auth(session.access_token())
            .query(query)
            .send()
            .await
            .map_err(|e| ProxyError::from_transport(Service::ResourceApi, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProxyError::from_transport(Service::ResourceApi, e))?;

        if !status.is_success() {
            error!(%status, path = %url_path(url), body = %text, "Spotify API error");
            return Err(ProxyError::Upstream {
                service: Service::ResourceApi,
                status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                message: format!(
                    "Spotify API error: {}",
                    status.canonical_reason().unwrap_or("unknown status")
                ),
            });
        }

        parse_body(Service::ResourceApi, &text)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

fn url_path(url: &str) -> &str {
    url.split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or(url)
}

//! Recommendation proxy.
//!
//! Two call shapes reach the ML backend and both stay supported:
//!
//! - **direct**: the caller's payload is forwarded to `POST /recommend` and
//!   the backend's JSON is relayed untouched.
//! - **feature-target**: the backend turns a target feature vector into
//!   recommended features, which then drive Spotify's recommendations
//!   endpoint together with the seed tracks. Only the second hop's track list
//!   is returned.
//!
//! A failure in any hop aborts the whole call; partial results never surface.

use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::{
    error::{ProxyError, Service, parse_body},
    session::Session,
    spotify::ResourceProxy,
    types::{AudioFeatureVector, PartialFeatures, RecommendationRequest},
};

const RECOMMEND_FAILED: &str = "Failed to fetch recommendations";

/// Keys that mark a body as a feature-target request.
const TARGETED_KEYS: [&str; 3] = ["token", "seedTracks", "targetFeatures"];

/// Body accepted by the inbound `/recommend` route.
///
/// Any object carrying one of `token`, `seedTracks` or `targetFeatures` is a
/// feature-target request and must parse as one; everything else is a
/// direct payload.
#[derive(Debug, Clone)]
pub enum RecommendPayload {
    Targeted {
        token: String,
        seed_tracks: Vec<String>,
        target_features: AudioFeatureVector,
    },
    Direct(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetedBody {
    token: String,
    seed_tracks: Vec<String>,
    target_features: AudioFeatureVector,
}

impl RecommendPayload {
    pub fn from_value(value: Value) -> Result<Self, ProxyError> {
        let targeted = matches!(
            &value,
            Value::Object(map) if TARGETED_KEYS.iter().any(|key| map.contains_key(*key))
        );
        if !targeted {
            return Ok(RecommendPayload::Direct(value));
        }

        let body: TargetedBody = serde_json::from_value(value).map_err(|e| {
            ProxyError::invalid(format!("Invalid feature-target payload: {e}"))
        })?;
        Ok(RecommendPayload::Targeted {
            token: body.token,
            seed_tracks: body.seed_tracks,
            target_features: body.target_features,
        })
    }
}

impl<'de> Deserialize<'de> for RecommendPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RecommendPayload::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
struct MlReply {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    recommended_features: Option<PartialFeatures>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecommendationProxy {
    client: Client,
    ml_backend_url: String,
    resources: ResourceProxy,
}

impl RecommendationProxy {
    pub fn new(client: Client, ml_backend_url: impl Into<String>, resources: ResourceProxy) -> Self {
        RecommendationProxy {
            client,
            ml_backend_url: ml_backend_url.into(),
            resources,
        }
    }

    /// Dispatches an inbound payload to the matching mode.
    pub async fn recommend(&self, payload: RecommendPayload) -> Result<Value, ProxyError> {
        match payload {
            RecommendPayload::Targeted {
                token,
                seed_tracks,
                target_features,
            } => {
                let session = Session::from_access_token(token);
                let request = RecommendationRequest {
                    seed_tracks,
                    target_features,
                };
                let tracks = self.recommend_targeted(&session, &request).await?;
                Ok(Value::Array(tracks))
            }
            RecommendPayload::Direct(body) => self.recommend_direct(&body).await,
        }
    }

    /// Forwards `payload` verbatim to the ML backend and relays its reply.
    ///
    /// A payload carrying a `token` is rejected: user credentials never go to
    /// the ML backend.
    pub async fn recommend_direct(&self, payload: &Value) -> Result<Value, ProxyError> {
        if payload.get("token").is_some() {
            return Err(ProxyError::invalid(
                "Direct recommendation payloads must not carry a token",
            ));
        }

        let text = self.post_ml(payload).await?;
        parse_body(Service::MlBackend, &text)
    }

    /// Runs the two-hop feature-target recommendation.
    ///
    /// Seeds must already be capped at [`RecommendationRequest::MAX_SEEDS`];
    /// longer lists are rejected rather than silently truncated.
    pub async fn recommend_targeted(
        &self,
        session: &Session,
        request: &RecommendationRequest,
    ) -> Result<Vec<Value>, ProxyError> {
        validate_seeds(&request.seed_tracks)?;
        if session.access_token().trim().is_empty() {
            return Err(ProxyError::invalid("Missing access token"));
        }

        let recommended = self.recommended_features(&request.target_features).await?;
        debug!(?recommended, "ML backend recommended features");

        let mut query = vec![("seed_tracks".to_string(), request.seed_tracks.join(","))];
        query.extend(recommended.target_params());

        let url = format!("{}/recommendations", self.resources.api_url());
        let payload = self
            .resources
            .get_json(session, &url, &query)
            .await
            .map_err(generic)?;

        let tracks = match payload {
            Value::Object(mut map) => match map.remove("tracks") {
                Some(Value::Array(tracks)) => tracks,
                _ => {
                    return Err(ProxyError::InvalidPayload {
                        service: Service::ResourceApi,
                        reason: "recommendations reply has no tracks array".into(),
                    });
                }
            },
            _ => {
                return Err(ProxyError::InvalidPayload {
                    service: Service::ResourceApi,
                    reason: "recommendations reply is not an object".into(),
                });
            }
        };

        info!(
            seeds = request.seed_tracks.len(),
            tracks = tracks.len(),
            "feature-target recommendation complete"
        );
        Ok(tracks)
    }

    /// First hop: target features in, recommended features out.
    ///
    /// The backend may return only a subset of the features; only those
    /// become targets of the second hop.
    async fn recommended_features(
        &self,
        target: &AudioFeatureVector,
    ) -> Result<PartialFeatures, ProxyError> {
        let text = self.post_ml(&json!({ "tracks": [target] })).await?;
        let reply: MlReply = parse_body(Service::MlBackend, &text)?;

        if reply.success == Some(false) {
            error!(error = ?reply.error, "ML backend reported failure");
            return Err(failed(Service::MlBackend));
        }

        match reply.recommended_features {
            Some(features) if !features.is_empty() => Ok(features),
            _ => Err(ProxyError::InvalidPayload {
                service: Service::MlBackend,
                reason: "reply has no recommended_features".into(),
            }),
        }
    }

    async fn post_ml(&self, body: &Value) -> Result<String, ProxyError> {
        let url = format!("{}/recommend", self.ml_backend_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProxyError::from_transport(Service::MlBackend, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProxyError::from_transport(Service::MlBackend, e))?;

        if !status.is_success() {
            error!(%status, body = %text, "ML backend error");
            return Err(failed(Service::MlBackend));
        }

        Ok(text)
    }
}

fn validate_seeds(seeds: &[String]) -> Result<(), ProxyError> {
    if seeds.is_empty() {
        return Err(ProxyError::invalid("At least one seed track is required"));
    }
    if seeds.len() > RecommendationRequest::MAX_SEEDS {
        return Err(ProxyError::invalid(format!(
            "At most {} seed tracks are allowed, got {}",
            RecommendationRequest::MAX_SEEDS,
            seeds.len()
        )));
    }
    if seeds.iter().any(|id| id.trim().is_empty()) {
        return Err(ProxyError::invalid("Seed track ids must not be empty"));
    }
    Ok(())
}

fn failed(service: Service) -> ProxyError {
    ProxyError::Upstream {
        service,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: RECOMMEND_FAILED.to_string(),
    }
}

// Upstream messages from the resource hop are replaced so both hops fail
// with the same wording.
fn generic(err: ProxyError) -> ProxyError {
    match err {
        ProxyError::Upstream { service, .. } => failed(service),
        other => other,
    }
}

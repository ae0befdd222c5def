use reqwest::Client;
use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{auth::load_session, spinner},
    config::Config,
    error,
    recommend::RecommendationProxy,
    spotify::{ResourceParams, ResourceProxy, ResourceRequest},
    success,
    types::{AudioFeatureVector, RecommendationRequest, ResourceKind, normalize_tracks},
    utils, warning,
};

fn list_request(kind: ResourceKind, limit: Option<u32>) -> ResourceRequest {
    let params = ResourceParams {
        limit,
        time_range: None,
    };
    match ResourceRequest::new(kind).and_then(|r| r.with_params(params)) {
        Ok(r) => r,
        Err(e) => error!("Invalid request for {}: {}", kind, e),
    }
}

/// Shows recent and top tracks plus the average audio features of the top
/// tracks.
pub async fn dashboard(config: &Config, limit: Option<u32>) {
    let session = load_session(config).await;
    let resources = ResourceProxy::new(Client::new(), config.api_url.clone());

    let recent_req = list_request(ResourceKind::RecentlyPlayed, limit);
    let top_req = list_request(ResourceKind::TopTracks, limit);

    let pb = spinner("Fetching listening data...");
    let (recent, top) = tokio::join!(
        resources.fetch(&session, &recent_req),
        resources.fetch(&session, &top_req)
    );

    let recent = match recent {
        Ok(v) => normalize_tracks(&v),
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch recently played tracks: {}", e)
        }
    };
    let top = match top {
        Ok(v) => normalize_tracks(&v),
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch top tracks: {}", e)
        }
    };

    // features need the ids of the top tracks first
    let ids: Vec<String> = top.iter().map(|t| t.id.clone()).collect();
    let features = if ids.is_empty() {
        Vec::new()
    } else {
        match resources.audio_features_by_id(&session, ids).await {
            Ok(f) => f,
            Err(e) => {
                warning!("Audio features unavailable: {}", e);
                Vec::new()
            }
        }
    };
    pb.finish_and_clear();

    println!("Recently Played");
    println!("{}", Table::new(utils::track_rows(&recent)));
    println!("Top Tracks");
    println!("{}", Table::new(utils::track_rows(&top)));

    if !features.is_empty() {
        let vectors: Vec<AudioFeatureVector> = features.iter().map(|(_, f)| *f).collect();
        println!("Average Audio Features");
        println!(
            "{}",
            Table::new(utils::feature_rows(&AudioFeatureVector::average(&vectors)))
        );
    }
}

/// Recommends tracks similar to the user's current top tracks.
pub async fn recommend(config: &Config) {
    let session = load_session(config).await;
    let client = Client::new();
    let resources = ResourceProxy::new(client.clone(), config.api_url.clone());
    let recommender =
        RecommendationProxy::new(client, config.ml_backend_url.clone(), resources.clone());

    let pb = spinner("Collecting seed tracks...");
    let top_req = list_request(
        ResourceKind::TopTracks,
        Some(RecommendationRequest::MAX_SEEDS as u32),
    );
    let top = match resources.fetch(&session, &top_req).await {
        Ok(v) => normalize_tracks(&v),
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch top tracks: {}", e)
        }
    };

    if top.is_empty() {
        pb.finish_and_clear();
        warning!("No top tracks yet, nothing to seed recommendations with.");
        return;
    }

    let ids: Vec<String> = top
        .iter()
        .take(RecommendationRequest::MAX_SEEDS)
        .map(|t| t.id.clone())
        .collect();
    let seeds = match resources.audio_features_by_id(&session, ids).await {
        Ok(f) => f,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch audio features: {}", e)
        }
    };

    pb.set_message("Asking the recommendation backend...");
    let request = RecommendationRequest::from_seeds(&seeds);
    let tracks = match recommender.recommend_targeted(&session, &request).await {
        Ok(t) => normalize_tracks(&Value::Array(t)),
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch recommendations: {}", e)
        }
    };
    pb.finish_and_clear();

    println!("Target Features");
    println!("{}", Table::new(utils::feature_rows(&request.target_features)));
    println!("{}", Table::new(utils::track_rows(&tracks)));
    success!("{} recommendations", tracks.len());
}

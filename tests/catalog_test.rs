mod common;

use axum::http::StatusCode;
use common::{MockUpstream, unreachable_url};
use predictify::{
    catalog::{CatalogClient, SongSearch, detail_message},
    error::{ProxyError, Service},
};
use reqwest::Client;
use serde_json::json;

fn catalog_for(base_url: &str) -> CatalogClient {
    CatalogClient::new(Client::new(), base_url)
}

fn search_reply() -> serde_json::Value {
    json!({
        "songs": [
            {
                "track_id": "s1",
                "track_name": "Nested And Flat",
                "artists": "Band A",
                "album_name": "LP",
                "track_genre": "rock",
                "popularity": 71,
                "duration_ms": 215000,
                "explicit": false,
                "danceability": 0.1,
                "energy": 0.4,
                "audio_features": {"danceability": 0.9}
            },
            {
                "track_id": "s2",
                "track_name": "Flat Only",
                "artists": "Band B",
                "tempo": 99.5
            }
        ],
        "total": 2
    })
}

#[tokio::test]
async fn test_search_forwards_query_and_limit() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json("/api/songs/search", StatusCode::OK, search_reply());

    let result = catalog_for(&upstream.url())
        .search_songs("love song", Some(5))
        .await
        .expect("search succeeds");

    assert_eq!(result.total, 2);
    assert_eq!(result.songs.len(), 2);

    let call = &upstream.requests_to("/api/songs/search")[0];
    assert_eq!(call.query_value("q").as_deref(), Some("love song"));
    assert_eq!(call.query_value("limit").as_deref(), Some("5"));
}

#[tokio::test]
async fn test_search_resolves_features() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json("/api/songs/search", StatusCode::OK, search_reply());

    let result = catalog_for(&upstream.url())
        .search_songs("song", None)
        .await
        .unwrap();

    // Nested wins over flat, flat fills the gaps, the rest is zero
    let first = result.songs[0].audio_features.expect("features resolved");
    assert_eq!(first.danceability, Some(0.9));
    assert_eq!(first.energy, Some(0.4));
    assert_eq!(first.liveness, Some(0.0));

    let second = result.songs[1].resolved_features();
    assert_eq!(second.tempo, 99.5);
    assert_eq!(second.danceability, 0.0);
}

#[tokio::test]
async fn test_search_rejects_blank_query() {
    let upstream = MockUpstream::start().await;

    let err = catalog_for(&upstream.url())
        .search_songs("  ", None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_search_generic_error_message() {
    let upstream = MockUpstream::start().await;
    upstream.reply(
        "/api/songs/search",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
    );

    let err = catalog_for(&upstream.url())
        .search_songs("song", None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Failed to fetch songs");
}

#[tokio::test]
async fn test_get_song_forwards_detail() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/api/songs/missing",
        StatusCode::NOT_FOUND,
        json!({"detail": "Song not found"}),
    );

    let err = catalog_for(&upstream.url())
        .get_song("missing")
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Song not found");
    assert_eq!(err.service(), Some(Service::Catalog));
}

#[tokio::test]
async fn test_get_song_encodes_track_id() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/api/songs/a%20b%2Fc",
        StatusCode::OK,
        json!({"track_id": "a b/c", "track_name": "Odd Id"}),
    );

    let song = catalog_for(&upstream.url())
        .get_song("a b/c")
        .await
        .unwrap();

    assert_eq!(song.track_id, "a b/c");
    assert_eq!(upstream.paths(), vec!["/api/songs/a%20b%2Fc"]);
}

#[tokio::test]
async fn test_recommendations_not_found_fallback() {
    let upstream = MockUpstream::start().await;

    // Unconfigured paths answer 404 without a body
    let err = catalog_for(&upstream.url())
        .recommendations_for("s1", Some(3))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Recommendations not found");

    let call = &upstream.requests_to("/api/songs/recommendations/s1")[0];
    assert_eq!(call.query_value("limit").as_deref(), Some("3"));
}

#[tokio::test]
async fn test_recommendations_relays_songs() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/api/songs/recommendations/s1",
        StatusCode::OK,
        json!({"songs": [{"track_id": "s9"}], "total": 1}),
    );

    let result = catalog_for(&upstream.url())
        .recommendations_for("s1", None)
        .await
        .unwrap();

    assert_eq!(result.songs[0].track_id, "s9");
    assert!(result.songs[0].audio_features.is_some());
}

#[tokio::test]
async fn test_catalog_base_path_is_kept() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/catalog/api/songs/search",
        StatusCode::OK,
        json!({"songs": [], "total": 0}),
    );

    let catalog = catalog_for(&format!("{}/catalog", upstream.url()));
    let result = catalog.search("beat").await.unwrap();

    assert!(result.songs.is_empty());
}

#[tokio::test]
async fn test_catalog_unreachable() {
    let base = unreachable_url().await;

    let err = catalog_for(&base).search_songs("song", None).await.unwrap_err();

    assert!(matches!(err, ProxyError::Unreachable { .. }));
    assert_eq!(err.service(), Some(Service::Catalog));
    assert_eq!(err.to_string(), "song catalog backend is not running");
    assert_eq!(
        err.body().details.as_deref(),
        Some("Please ensure the song catalog backend is started at its configured address")
    );
}

#[test]
fn test_detail_message() {
    assert_eq!(
        detail_message(r#"{"detail": "Song not found"}"#).as_deref(),
        Some("Song not found")
    );
    assert_eq!(detail_message(r#"{"detail": ""}"#), None);
    assert_eq!(detail_message(r#"{"detail": [{"loc": ["q"]}]}"#), None);
    assert_eq!(detail_message("plain text"), None);
}

mod common;

use axum::http::StatusCode;
use common::{MockUpstream, test_config, unreachable_url};
use predictify::{
    error::ProxyError,
    session::Session,
    spotify::{ResourceParams, ResourceProxy, ResourceRequest},
    types::{AudioFeatureVector, ResourceKind, TimeRange},
};
use reqwest::Client;
use serde_json::json;

fn proxy_for(base_url: &str) -> ResourceProxy {
    ResourceProxy::new(Client::new(), test_config(base_url).api_url)
}

#[test]
fn test_parse_rejects_unknown_type() {
    let err = ResourceRequest::parse("playlists", None, None, None).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Invalid type");
}

#[test]
fn test_parse_requires_ids_for_audio_features() {
    assert!(ResourceRequest::parse("audioFeatures", None, None, None).is_err());
    assert!(ResourceRequest::parse("audioFeatures", Some(vec![]), None, None).is_err());
    assert!(
        ResourceRequest::parse("audioFeatures", Some(vec!["a".into(), " ".into()]), None, None)
            .is_err()
    );
    assert!(ResourceRequest::parse("audioFeatures", Some(vec!["a".into()]), None, None).is_ok());
}

#[test]
fn test_parse_time_range() {
    let request = ResourceRequest::parse("topTracks", None, Some(10), Some("long_term")).unwrap();
    assert_eq!(request.kind(), ResourceKind::TopTracks);
    assert_eq!(
        request.query(),
        vec![("limit", "10".to_string()), ("time_range", "long_term".to_string())]
    );

    // Unknown window
    let err = ResourceRequest::parse("topTracks", None, None, Some("forever")).unwrap_err();
    assert_eq!(err.to_string(), "Invalid time range: forever");

    // Only top lists take a window
    assert!(ResourceRequest::parse("recentlyPlayed", None, None, Some("short_term")).is_err());
}

#[test]
fn test_list_request_drops_track_ids() {
    let request =
        ResourceRequest::parse("savedTracks", Some(vec!["a".into()]), None, None).unwrap();
    assert!(request.track_ids().is_empty());
    assert!(request.query().is_empty());
}

#[tokio::test]
async fn test_fetch_relays_items_of_paged_payload() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/v1/me/top/tracks",
        StatusCode::OK,
        json!({
            "items": [{"id": "t1", "name": "First"}, {"id": "t2", "name": "Second"}],
            "total": 2,
            "next": null
        }),
    );

    let request = ResourceRequest::new(ResourceKind::TopTracks)
        .and_then(|r| {
            r.with_params(ResourceParams {
                limit: Some(5),
                time_range: Some(TimeRange::ShortTerm),
            })
        })
        .unwrap();

    let session = Session::from_access_token("user-token");
    let payload = proxy_for(&upstream.url())
        .fetch(&session, &request)
        .await
        .expect("fetch succeeds");

    assert_eq!(
        payload,
        json!([{"id": "t1", "name": "First"}, {"id": "t2", "name": "Second"}])
    );

    let call = &upstream.requests_to("/v1/me/top/tracks")[0];
    assert_eq!(call.method, "GET");
    assert_eq!(call.header("authorization"), Some("Bearer user-token"));
    assert_eq!(call.query_value("limit").as_deref(), Some("5"));
    assert_eq!(call.query_value("time_range").as_deref(), Some("short_term"));
}

#[tokio::test]
async fn test_fetch_relays_bare_payload_unchanged() {
    let upstream = MockUpstream::start().await;
    let reply = json!({
        "audio_features": [
            {"id": "c", "danceability": 0.3},
            {"id": "a", "danceability": 0.1},
            {"id": "b", "danceability": 0.2}
        ]
    });
    upstream.reply_json("/v1/audio-features", StatusCode::OK, reply.clone());

    let request =
        ResourceRequest::audio_features(vec!["c".into(), "a".into(), "b".into()]).unwrap();
    let payload = proxy_for(&upstream.url())
        .fetch(&Session::from_access_token("tok"), &request)
        .await
        .unwrap();

    assert_eq!(payload, reply);

    // Ids keep their order
    let call = &upstream.requests_to("/v1/audio-features")[0];
    assert_eq!(call.query_value("ids").as_deref(), Some("c,a,b"));
}

#[tokio::test]
async fn test_fetch_null_items_is_bare() {
    let upstream = MockUpstream::start().await;
    let reply = json!({"items": null, "cursors": {}});
    upstream.reply_json("/v1/me/tracks", StatusCode::OK, reply.clone());

    let request = ResourceRequest::new(ResourceKind::SavedTracks).unwrap();
    let payload = proxy_for(&upstream.url())
        .fetch(&Session::from_access_token("tok"), &request)
        .await
        .unwrap();

    assert_eq!(payload, reply);
}

#[tokio::test]
async fn test_fetch_rejects_missing_token_without_calling_upstream() {
    let upstream = MockUpstream::start().await;
    let request = ResourceRequest::new(ResourceKind::RecentlyPlayed).unwrap();

    let err = proxy_for(&upstream.url())
        .fetch(&Session::from_access_token(""), &request)
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_fetch_maps_upstream_error_to_500() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/v1/me/player/recently-played",
        StatusCode::UNAUTHORIZED,
        json!({"error": {"status": 401, "message": "The access token expired"}}),
    );

    let request = ResourceRequest::new(ResourceKind::RecentlyPlayed).unwrap();
    let err = proxy_for(&upstream.url())
        .fetch(&Session::from_access_token("expired"), &request)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Spotify API error: Unauthorized");
    assert!(!err.body().error.contains("expired"));
}

#[tokio::test]
async fn test_fetch_empty_body() {
    let upstream = MockUpstream::start().await;
    upstream.reply("/v1/me/top/artists", StatusCode::OK, "");

    let request = ResourceRequest::new(ResourceKind::TopArtists).unwrap();
    let err = proxy_for(&upstream.url())
        .fetch(&Session::from_access_token("tok"), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::EmptyBody { .. }));
}

#[tokio::test]
async fn test_fetch_unreachable_api() {
    let base = unreachable_url().await;
    let request = ResourceRequest::new(ResourceKind::TopTracks).unwrap();

    let err = proxy_for(&base)
        .fetch(&Session::from_access_token("tok"), &request)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_audio_features_by_id_pairs_by_position() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json(
        "/v1/audio-features",
        StatusCode::OK,
        json!({
            "audio_features": [
                {"id": "x", "energy": 0.8, "tempo": 128.0},
                null,
                {"id": "z", "energy": null, "valence": 0.4}
            ]
        }),
    );

    let features = proxy_for(&upstream.url())
        .audio_features_by_id(
            &Session::from_access_token("tok"),
            vec!["x".into(), "y".into(), "z".into()],
        )
        .await
        .unwrap();

    let ids: Vec<&str> = features.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);

    assert_eq!(features[0].1.energy, 0.8);
    assert_eq!(features[0].1.tempo, 128.0);
    assert_eq!(features[1].1, AudioFeatureVector::default());
    assert_eq!(features[2].1.energy, 0.0);
    assert_eq!(features[2].1.valence, 0.4);
}

#[tokio::test]
async fn test_audio_features_by_id_requires_array() {
    let upstream = MockUpstream::start().await;
    upstream.reply_json("/v1/audio-features", StatusCode::OK, json!({"unexpected": true}));

    let err = proxy_for(&upstream.url())
        .audio_features_by_id(&Session::from_access_token("tok"), vec!["x".into()])
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::InvalidPayload { .. }));
}

use predictify::types::{AudioFeatureVector, TrackReference};
use predictify::utils::*;
use serde_json::json;

#[test]
fn test_generate_state() {
    let state = generate_state();

    assert_eq!(state.len(), STATE_LEN);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two states should differ
    assert_ne!(state, generate_state());
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(0), "0:00");
    assert_eq!(format_duration_ms(59_999), "0:59");
    assert_eq!(format_duration_ms(215_000), "3:35");
    assert_eq!(format_duration_ms(3_600_000), "60:00");
    assert_eq!(format_duration_ms(-5), "0:00");
}

#[test]
fn test_track_rows_are_numbered() {
    let tracks: Vec<TrackReference> = predictify::types::normalize_tracks(&json!([
        {"id": "a", "name": "One", "artists": [{"name": "X"}]},
        {"id": "b", "name": "Two"}
    ]));

    let rows = track_rows(&tracks);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].position, 1);
    assert_eq!(rows[1].position, 2);
    assert_eq!(rows[0].artists, "X");
    assert_eq!(rows[1].artists, "Unknown Artist");
    assert_eq!(rows[1].url, "https://open.spotify.com/track/b");
}

#[test]
fn test_feature_rows_formatting() {
    let vector = AudioFeatureVector {
        danceability: 0.51234,
        tempo: 121.456,
        loudness: -5.26,
        ..Default::default()
    };

    let rows = feature_rows(&vector);
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0].feature, "danceability");
    assert_eq!(rows[0].value, "0.512");
    assert_eq!(rows[3].value, "121.5 BPM");
    assert_eq!(rows[5].value, "-5.3 dB");
}

use rand::{Rng, distr::Alphanumeric};

use crate::types::{
    AudioFeatureVector, FeatureTableRow, Song, SongTableRow, TrackReference, TrackTableRow,
};

/// Length of the OAuth `state` value.
pub const STATE_LEN: usize = 32;

pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Formats a duration in milliseconds as `m:ss`.
pub fn format_duration_ms(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn track_rows(tracks: &[TrackReference]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            name: t.name.clone(),
            artists: t.artist_names(),
            url: t.url.clone(),
        })
        .collect()
}

pub fn song_rows(songs: &[Song]) -> Vec<SongTableRow> {
    songs
        .iter()
        .map(|s| SongTableRow {
            id: s.track_id.clone(),
            name: s.track_name.clone(),
            artists: s.artists.clone(),
            album: s.album_name.clone(),
            genre: s.track_genre.clone(),
            popularity: s.popularity,
        })
        .collect()
}

pub fn feature_rows(features: &AudioFeatureVector) -> Vec<FeatureTableRow> {
    features
        .named()
        .map(|(name, value)| FeatureTableRow {
            feature: name.to_string(),
            value: match name {
                "tempo" => format!("{value:.1} BPM"),
                "loudness" => format!("{value:.1} dB"),
                _ => format!("{value:.3}"),
            },
        })
        .collect()
}

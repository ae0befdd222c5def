use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tabled::Tabled;

/// Base of the public track links derived during normalization.
pub const TRACK_URL_BASE: &str = "https://open.spotify.com/track";

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Access/refresh credential pair returned by the token endpoint.
///
/// Fields the proxy does not interpret (`token_type`, `scope`, ...) are kept
/// in `extra`, so relaying a pair never reshapes it.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    RecentlyPlayed,
    TopTracks,
    TopArtists,
    SavedTracks,
    AudioFeatures,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::RecentlyPlayed,
        ResourceKind::TopTracks,
        ResourceKind::TopArtists,
        ResourceKind::SavedTracks,
        ResourceKind::AudioFeatures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::RecentlyPlayed => "recentlyPlayed",
            ResourceKind::TopTracks => "topTracks",
            ResourceKind::TopArtists => "topArtists",
            ResourceKind::SavedTracks => "savedTracks",
            ResourceKind::AudioFeatures => "audioFeatures",
        }
    }

    /// Upstream path relative to the resource API base.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::RecentlyPlayed => "/me/player/recently-played",
            ResourceKind::TopTracks => "/me/top/tracks",
            ResourceKind::TopArtists => "/me/top/artists",
            ResourceKind::SavedTracks => "/me/tracks",
            ResourceKind::AudioFeatures => "/audio-features",
        }
    }

    pub fn is_top_list(&self) -> bool {
        matches!(self, ResourceKind::TopTracks | ResourceKind::TopArtists)
    }
}

impl FromStr for ResourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl FromStr for TimeRange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(TimeRange::ShortTerm),
            "medium_term" => Ok(TimeRange::MediumTerm),
            "long_term" => Ok(TimeRange::LongTerm),
            _ => Err(()),
        }
    }
}

/// Upstream resource payloads come either wrapped in a paging object or bare.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePayload {
    Paged(Value),
    Bare(Value),
}

impl ResourcePayload {
    pub fn classify(payload: Value) -> Self {
        match payload {
            Value::Object(mut map) if map.get("items").is_some_and(|v| !v.is_null()) => {
                ResourcePayload::Paged(map.remove("items").unwrap_or(Value::Null))
            }
            other => ResourcePayload::Bare(other),
        }
    }

    pub fn into_relayed(self) -> Value {
        match self {
            ResourcePayload::Paged(items) => items,
            ResourcePayload::Bare(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// UI-facing track shape. Always carries an `id` and a derived `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackReference {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    pub url: String,
}

impl TrackReference {
    pub fn artist_names(&self) -> String {
        let names: Vec<&str> = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            names.join(", ")
        }
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }
}

/// Lenient view of an upstream track, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<ArtistRef>>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

/// The two upstream track shapes: history endpoints wrap the track,
/// top lists return it bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrackPayload {
    Wrapped { track: RawTrack },
    Bare(RawTrack),
}

impl TrackPayload {
    pub fn into_reference(self) -> Option<TrackReference> {
        let raw = match self {
            TrackPayload::Wrapped { track } => track,
            TrackPayload::Bare(track) => track,
        };

        let id = raw.id.filter(|id| !id.is_empty())?;
        Some(TrackReference {
            url: format!("{TRACK_URL_BASE}/{id}"),
            name: raw
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
            artists: raw.artists.unwrap_or_default(),
            album: raw.album.unwrap_or_default(),
            id,
        })
    }
}

/// Normalizes a relayed resource list into [`TrackReference`]s.
///
/// Accepts the relayed array or a payload still wrapped in `items`. Entries
/// without an id are dropped; missing names and artists degrade to
/// placeholders.
pub fn normalize_tracks(payload: &Value) -> Vec<TrackReference> {
    let items = match ResourcePayload::classify(payload.clone()).into_relayed() {
        Value::Array(items) => items,
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<TrackPayload>(item).ok())
        .filter_map(TrackPayload::into_reference)
        .collect()
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

pub const FEATURE_NAMES: [&str; 8] = [
    "danceability",
    "energy",
    "valence",
    "tempo",
    "instrumentalness",
    "loudness",
    "acousticness",
    "liveness",
];

/// Audio features of a track. Absent or null values read as `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatureVector {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub danceability: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub energy: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub valence: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub tempo: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub instrumentalness: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub loudness: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub acousticness: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub liveness: f64,
}

impl AudioFeatureVector {
    /// Feature values in [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; 8] {
        [
            self.danceability,
            self.energy,
            self.valence,
            self.tempo,
            self.instrumentalness,
            self.loudness,
            self.acousticness,
            self.liveness,
        ]
    }

    pub fn from_values(v: [f64; 8]) -> Self {
        AudioFeatureVector {
            danceability: v[0],
            energy: v[1],
            valence: v[2],
            tempo: v[3],
            instrumentalness: v[4],
            loudness: v[5],
            acousticness: v[6],
            liveness: v[7],
        }
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.values())
    }

    /// Component-wise mean. An empty slice yields the zero vector.
    pub fn average(vectors: &[AudioFeatureVector]) -> AudioFeatureVector {
        if vectors.is_empty() {
            return AudioFeatureVector::default();
        }

        let mut sums = [0.0; 8];
        for vector in vectors {
            for (sum, value) in sums.iter_mut().zip(vector.values()) {
                *sum += value;
            }
        }

        let count = vectors.len() as f64;
        AudioFeatureVector::from_values(sums.map(|sum| sum / count))
    }
}

/// Seeds and target features for a feature-target recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub seed_tracks: Vec<String>,
    pub target_features: AudioFeatureVector,
}

impl RecommendationRequest {
    /// Upstream limit on the number of seed tracks.
    pub const MAX_SEEDS: usize = 5;

    /// Builds a request by averaging the features of the chosen seeds.
    ///
    /// `seeds` pairs each track id with its features; only the first
    /// [`Self::MAX_SEEDS`] entries are used.
    pub fn from_seeds(seeds: &[(String, AudioFeatureVector)]) -> Self {
        let chosen = &seeds[..seeds.len().min(Self::MAX_SEEDS)];
        let features: Vec<AudioFeatureVector> = chosen.iter().map(|(_, f)| *f).collect();

        RecommendationRequest {
            seed_tracks: chosen.iter().map(|(id, _)| id.clone()).collect(),
            target_features: AudioFeatureVector::average(&features),
        }
    }
}

/// Feature fields as the catalog reports them: any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<f64>,
}

impl PartialFeatures {
    fn values(&self) -> [Option<f64>; 8] {
        [
            self.danceability,
            self.energy,
            self.valence,
            self.tempo,
            self.instrumentalness,
            self.loudness,
            self.acousticness,
            self.liveness,
        ]
    }

    /// Features that are actually present, in [`FEATURE_NAMES`] order.
    pub fn present(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES
            .into_iter()
            .zip(self.values())
            .filter_map(|(name, value)| value.map(|v| (name, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// `target_<feature>` query parameters for the upstream recommendations
    /// endpoint. Absent features produce no parameter.
    pub fn target_params(&self) -> Vec<(String, String)> {
        self.present()
            .map(|(name, value)| (format!("target_{name}"), value.to_string()))
            .collect()
    }
}

impl From<AudioFeatureVector> for PartialFeatures {
    fn from(v: AudioFeatureVector) -> Self {
        PartialFeatures {
            danceability: Some(v.danceability),
            energy: Some(v.energy),
            valence: Some(v.valence),
            tempo: Some(v.tempo),
            instrumentalness: Some(v.instrumentalness),
            loudness: Some(v.loudness),
            acousticness: Some(v.acousticness),
            liveness: Some(v.liveness),
        }
    }
}

/// A song as served by the catalog backend.
///
/// Features arrive either as flat fields or in a nested `audio_features`
/// object, depending on the endpoint that produced the song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub track_id: String,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub artists: String,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub track_genre: String,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(flatten)]
    pub flat_features: PartialFeatures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_features: Option<PartialFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speechiness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<i64>,
}

impl Song {
    /// Merges nested and flat features, nested first, missing as `0.0`.
    pub fn resolved_features(&self) -> AudioFeatureVector {
        let nested = self.audio_features.unwrap_or_default().values();
        let flat = self.flat_features.values();

        let mut merged = [0.0; 8];
        for (i, slot) in merged.iter_mut().enumerate() {
            *slot = nested[i].or(flat[i]).unwrap_or(0.0);
        }
        AudioFeatureVector::from_values(merged)
    }

    /// Returns the song with a fully populated `audio_features` object.
    pub fn with_resolved_features(mut self) -> Self {
        self.audio_features = Some(self.resolved_features().into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongQueryResult {
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub total: u64,
}

impl SongQueryResult {
    pub fn with_resolved_features(self) -> Self {
        SongQueryResult {
            songs: self
                .songs
                .into_iter()
                .map(Song::with_resolved_features)
                .collect(),
            total: self.total,
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub name: String,
    pub artists: String,
    pub url: String,
}

#[derive(Tabled)]
pub struct SongTableRow {
    pub id: String,
    pub name: String,
    pub artists: String,
    pub album: String,
    pub genre: String,
    pub popularity: i64,
}

#[derive(Tabled)]
pub struct FeatureTableRow {
    pub feature: String,
    pub value: String,
}

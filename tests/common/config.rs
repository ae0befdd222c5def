use std::collections::HashMap;

use predictify::config::Config;
use tokio::net::TcpListener;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";

/// Configuration whose upstreams all live under `base_url`:
/// token endpoint at `/api/token`, resource API at `/v1`, ML backend at
/// `/ml` and the catalog at the root.
pub fn test_config(base_url: &str) -> Config {
    test_config_with(base_url, &[])
}

/// Like [`test_config`], with extra or overriding variables.
pub fn test_config_with(base_url: &str, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SPOTIFY_CLIENT_ID".into(), CLIENT_ID.into()),
        ("SPOTIFY_CLIENT_SECRET".into(), CLIENT_SECRET.into()),
        ("SPOTIFY_REDIRECT_URI".into(), REDIRECT_URI.into()),
        ("SPOTIFY_API_TOKEN_URL".into(), format!("{base_url}/api/token")),
        ("SPOTIFY_API_URL".into(), format!("{base_url}/v1")),
        ("ML_BACKEND_URL".into(), format!("{base_url}/ml")),
        ("CATALOG_BACKEND_URL".into(), base_url.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config is valid")
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

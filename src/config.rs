//! Configuration management for the Predictify proxy.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files. Every upstream address, the OAuth client
//! credentials and the bind address are deployment-time settings: nothing in
//! the proxy layer hard-codes a host or port.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, fmt, path::PathBuf, str::FromStr};

use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ML_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CATALOG_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SCOPE: &str =
    "user-read-recently-played user-top-read user-read-currently-playing";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to prepare config directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read .env file: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// How the confidential client credentials reach the token endpoint.
///
/// Some deployments expect an HTTP Basic header, others expect the id and
/// secret as form fields next to the grant. Both are selected here rather
/// than in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialMode {
    #[default]
    Basic,
    Body,
}

impl FromStr for CredentialMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "header" => Ok(CredentialMode::Basic),
            "body" | "form" => Ok(CredentialMode::Body),
            _ => Err(ConfigError::InvalidValue {
                var: "SPOTIFY_CREDENTIAL_MODE",
                value: s.to_string(),
                reason: "expected `basic` or `body`",
            }),
        }
    }
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialMode::Basic => write!(f, "basic"),
            CredentialMode::Body => write!(f, "body"),
        }
    }
}

/// OAuth client settings used by the token exchange service.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub credential_mode: CredentialMode,
    pub auth_url: String,
    pub token_url: String,
}

// The secret never shows up in logs, not even at debug level.
impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("credential_mode", &self.credential_mode)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Complete runtime configuration of the proxy.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub oauth: OAuthConfig,
    pub api_url: String,
    pub ml_backend_url: String,
    pub catalog_backend_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when one of `SPOTIFY_CLIENT_ID`,
    /// `SPOTIFY_CLIENT_SECRET` or `SPOTIFY_REDIRECT_URI` is absent, and
    /// [`ConfigError::InvalidValue`] for an unknown credential mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset, so `FOO=` in a `.env` file falls back to
    /// the default instead of producing an empty URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(&lookup, key);
        let required = |key: &'static str| get(key).ok_or(ConfigError::MissingVar(key));
        let url_or = |key: &str, default: &str| base_url(&lookup, key, default);

        let credential_mode = match get("SPOTIFY_CREDENTIAL_MODE") {
            Some(mode) => mode.parse()?,
            None => CredentialMode::default(),
        };

        Ok(Config {
            server_addr: get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.into()),
            oauth: OAuthConfig {
                client_id: required("SPOTIFY_CLIENT_ID")?,
                client_secret: required("SPOTIFY_CLIENT_SECRET")?,
                redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
                scope: get("SPOTIFY_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.into()),
                credential_mode,
                auth_url: url_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
                token_url: url_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            },
            api_url: url_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            ml_backend_url: url_or("ML_BACKEND_URL", DEFAULT_ML_BACKEND_URL),
            catalog_backend_url: catalog_url_from_lookup(&lookup),
        })
    }
}

/// Song-catalog base URL on its own, for commands that need no OAuth client.
pub fn catalog_url_from_env() -> String {
    catalog_url_from_lookup(|key| env::var(key).ok())
}

pub fn catalog_url_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    base_url(&lookup, "CATALOG_BACKEND_URL", DEFAULT_CATALOG_BACKEND_URL)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn base_url<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Loads environment variables from `.env` files.
///
/// Looks first in the platform-specific local data directory
/// (`predictify/.env`), then in the working directory. Neither file is
/// required; variables already present in the environment are never
/// overridden.
///
/// The data directory lives at:
/// - Linux: `~/.local/share/predictify/.env`
/// - macOS: `~/Library/Application Support/predictify/.env`
/// - Windows: `%LOCALAPPDATA%/predictify/.env`
///
/// # Errors
///
/// Fails if the data directory cannot be created or an existing `.env`
/// file cannot be parsed.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)?;
    }

    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Location of the user-level `.env` file.
pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("predictify/.env");
    path
}

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use reqwest::Client;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    Res, api,
    catalog::CatalogClient,
    config::Config,
    recommend::RecommendationProxy,
    session::LoginSlot,
    spotify::{ResourceProxy, TokenExchange},
};

/// Services shared by every handler. Cloning is cheap and shares the
/// underlying HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenExchange,
    pub resources: ResourceProxy,
    pub recommender: RecommendationProxy,
    pub catalog: CatalogClient,
    pub pending_login: LoginSlot,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: &Config, client: Client) -> Self {
        let resources = ResourceProxy::new(client.clone(), config.api_url.clone());
        AppState {
            tokens: TokenExchange::new(client.clone(), config.oauth.clone()),
            recommender: RecommendationProxy::new(
                client.clone(),
                config.ml_backend_url.clone(),
                resources.clone(),
            ),
            catalog: CatalogClient::new(client, config.catalog_backend_url.clone()),
            resources,
            pending_login: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_login_slot(mut self, slot: LoginSlot) -> Self {
        self.pending_login = slot;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/tokenExchange", post(api::token_exchange))
        .route("/tokenRefresh", post(api::token_refresh))
        .route("/resource", post(api::resource))
        .route("/recommend", post(api::recommend))
        .route("/songs/search", get(api::search))
        .route("/songs/recommendations/{track_id}", get(api::recommendations))
        .route("/songs/{track_id}", get(api::song))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Binds the configured address and serves the proxy until the process ends.
///
/// `login` lets the CLI share its pending-login slot with `/callback`.
pub async fn serve(config: Config, login: Option<LoginSlot>) -> Res<()> {
    let mut state = AppState::new(&config);
    if let Some(slot) = login {
        state = state.with_login_slot(slot);
    }

    let addr = SocketAddr::from_str(&config.server_addr)
        .map_err(|e| format!("Failed to parse server address {}: {}", config.server_addr, e))?;

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "predictify proxy listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

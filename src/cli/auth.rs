use std::{sync::Arc, time::Duration};

use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    error, info, server,
    session::{self, LoginSlot, PendingLogin, Session, SessionStore},
    spotify::TokenExchange,
    success, utils, warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the authorization-code flow from the terminal.
///
/// Starts the proxy with a pending login, sends the browser to the consent
/// page and waits for `/callback` to finish the exchange. The configured
/// redirect URI has to point at this server's `/callback`.
pub async fn login(config: &Config) {
    let csrf = utils::generate_state();
    let slot: LoginSlot = Arc::new(Mutex::new(Some(PendingLogin::new(csrf.clone()))));

    let tokens = TokenExchange::new(Client::new(), config.oauth.clone());
    let auth_url = match tokens.authorize_url(&csrf) {
        Ok(url) => url,
        Err(e) => error!("Cannot build authorize url. Err: {}", e),
    };

    let server_config = config.clone();
    let server_slot = Arc::clone(&slot);
    tokio::spawn(async move {
        if let Err(e) = server::serve(server_config, Some(server_slot)).await {
            tracing::error!(error = %e, "callback server stopped");
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }
    info!("Waiting for authorization on {} ...", config.oauth.redirect_uri);

    match session::wait_for_login(&slot, LOGIN_TIMEOUT).await {
        Ok(session) => {
            if let Err(e) = SessionStore::default().persist(&session).await {
                error!("Failed to save session: {}", e);
            }
            success!("Authentication successful!");
        }
        Err(e) => error!("Authentication failed: {}", e),
    }
}

pub async fn logout() {
    match SessionStore::default().clear().await {
        Ok(()) => success!("Logged out."),
        Err(e) => error!("Failed to remove session: {}", e),
    }
}

/// Loads the stored session, refreshing it first when it has expired.
pub(crate) async fn load_session(config: &Config) -> Session {
    let store = SessionStore::default();
    let mut session = match store.load().await {
        Ok(s) => s,
        Err(e) => error!(
            "No session found. Please run predictify login\n Error: {}",
            e
        ),
    };

    if !session.is_expired() {
        return session;
    }

    let Some(refresh_token) = session.refresh_token().map(str::to_string) else {
        error!("Session expired. Please run predictify login");
    };

    let tokens = TokenExchange::new(Client::new(), config.oauth.clone());
    match tokens.refresh(&refresh_token).await {
        Ok(pair) => {
            session.apply_refresh(pair);
            if let Err(e) = store.persist(&session).await {
                warning!("Failed to save refreshed session: {}", e);
            }
            session
        }
        Err(e) => error!("Session expired and refresh failed: {}", e),
    }
}

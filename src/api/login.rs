use axum::{
    Extension,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{error::ProxyError, server::AppState, utils};

/// Sends the user to the provider's consent page.
///
/// Reuses the state of a pending terminal login so its callback can be
/// matched; otherwise a fresh state is generated and verifying it on return
/// is left to the browser client.
pub async fn login(Extension(state): Extension<AppState>) -> Result<Response, ProxyError> {
    let csrf = match state.pending_login.lock().await.as_ref() {
        Some(pending) => pending.state.clone(),
        None => utils::generate_state(),
    };

    let url = state.tokens.authorize_url(&csrf)?;
    debug!("redirecting to authorize url");
    Ok(Redirect::to(&url).into_response())
}

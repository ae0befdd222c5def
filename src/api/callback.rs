use std::collections::HashMap;

use axum::{Extension, extract::Query, http::StatusCode, response::Html};
use tracing::{info, warn};

use crate::{server::AppState, session::Session};

type Page = (StatusCode, Html<&'static str>);

const NO_LOGIN: Page = (StatusCode::CONFLICT, Html("<h4>No login in progress.</h4>"));
const ALREADY_DONE: Page = (
    StatusCode::CONFLICT,
    Html("<h4>Login already completed.</h4>"),
);

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<AppState>,
) -> Page {
    let (expected, code) = {
        let mut slot = state.pending_login.lock().await;
        let Some(pending) = slot.as_mut() else {
            return NO_LOGIN;
        };
        if pending.is_finished() {
            return ALREADY_DONE;
        }

        if params.get("state") != Some(&pending.state) {
            warn!("callback state does not match pending login");
            return (StatusCode::BAD_REQUEST, Html("<h4>State mismatch.</h4>"));
        }

        if let Some(reason) = params.get("error") {
            warn!(reason, "authorization denied");
            pending.failure = Some(reason.clone());
            return (StatusCode::OK, Html("<h4>Login failed.</h4>"));
        }

        let Some(code) = params.get("code") else {
            return (
                StatusCode::BAD_REQUEST,
                Html("<h4>Missing authorization code.</h4>"),
            );
        };
        (pending.state.clone(), code.clone())
    };

    // The slot stays unlocked during the round-trip to the provider.
    let result = state.tokens.exchange(&code).await;

    let mut slot = state.pending_login.lock().await;
    let pending = match slot.as_mut() {
        Some(pending) if pending.state == expected => pending,
        _ => return NO_LOGIN,
    };
    if pending.is_finished() {
        return ALREADY_DONE;
    }

    match result {
        Ok(token) => {
            info!("login completed");
            pending.session = Some(Session::new(token));
            (
                StatusCode::OK,
                Html("<h2>Authentication successful.</h2><p>Close browser window.</p>"),
            )
        }
        Err(e) => {
            warn!(service = ?e.service(), error = %e, "token exchange failed");
            pending.failure = Some(e.to_string());
            (e.status(), Html("<h4>Login failed.</h4>"))
        }
    }
}

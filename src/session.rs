//! Explicit client session.
//!
//! Every proxy call receives a [`Session`] argument instead of reading a
//! token from ambient storage. The server builds a throwaway session from
//! the token in each request; the terminal client keeps one on disk through
//! [`SessionStore`].

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::types::TokenPair;

/// Seconds before the nominal expiry at which a token is treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: TokenPair,
    pub obtained_at: u64,
}

impl Session {
    pub fn new(token: TokenPair) -> Self {
        Session {
            token,
            obtained_at: Utc::now().timestamp() as u64,
        }
    }

    /// Session around a bare access token supplied by a caller.
    ///
    /// Nothing is known about its lifetime, so it never reports itself as
    /// expired.
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Session {
            token: TokenPair {
                access_token: access_token.into(),
                refresh_token: None,
                expires_in: 0,
                extra: Default::default(),
            },
            obtained_at: Utc::now().timestamp() as u64,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.token.refresh_token.as_deref()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        if self.token.expires_in == 0 {
            return false;
        }
        let deadline = (self.obtained_at + self.token.expires_in).saturating_sub(EXPIRY_MARGIN_SECS);
        now >= deadline
    }

    /// Replaces the token after a refresh grant.
    ///
    /// The token endpoint may omit `refresh_token` in a refresh reply; the
    /// previous one stays valid in that case.
    pub fn apply_refresh(&mut self, mut refreshed: TokenPair) {
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = self.token.refresh_token.take();
        }
        self.token = refreshed;
        self.obtained_at = Utc::now().timestamp() as u64;
    }
}

/// A login started by the terminal client and finished by `/callback`.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// CSRF value sent with the authorize URL; the callback must echo it.
    pub state: String,
    pub session: Option<Session>,
    pub failure: Option<String>,
}

impl PendingLogin {
    pub fn new(state: impl Into<String>) -> Self {
        PendingLogin {
            state: state.into(),
            session: None,
            failure: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_some() || self.failure.is_some()
    }
}

/// Shared between the callback handler and the waiting CLI.
pub type LoginSlot = Arc<Mutex<Option<PendingLogin>>>;

/// Waits until the pending login in `slot` finishes or `max_wait` elapses.
///
/// Polls the slot every 250 ms; the callback handler fills it in from the
/// server task. The slot is emptied once a result is taken.
pub async fn wait_for_login(slot: &LoginSlot, max_wait: Duration) -> Result<Session, String> {
    let deadline = tokio::time::Instant::now() + max_wait;

    loop {
        {
            let mut lock = slot.lock().await;
            let finished = match lock.as_ref() {
                None => return Err("no login in progress".to_string()),
                Some(pending) => pending.is_finished(),
            };

            if finished {
                let pending = lock.take().ok_or("login slot emptied concurrently")?;
                return match (pending.session, pending.failure) {
                    (Some(session), _) => Ok(session),
                    (None, Some(failure)) => Err(failure),
                    (None, None) => Err("login finished without a result".to_string()),
                };
            }
        }

        if tokio::time::Instant::now() >= deadline {
            return Err("timed out waiting for authorization".to_string());
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// On-disk home of the terminal client's session.
pub struct SessionStore {
    path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new(Self::default_path())
    }
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        SessionStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub async fn load(&self) -> Result<Session, String> {
        let content = async_fs::read_to_string(&self.path)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_str(&content).map_err(|e| e.to_string())
    }

    pub async fn persist(&self, session: &Session) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(session).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Removes the stored session. Clearing an absent session is not an error.
    pub async fn clear(&self) -> Result<(), String> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn default_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("predictify/session.json");
        path
    }
}

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, warn};

use super::SongSearch;
use crate::types::Song;

/// Inactivity required before a query is sent.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Shorter queries never reach the backend.
pub const MIN_QUERY_LEN: usize = 2;

/// Debounced autocomplete state in front of a [`SongSearch`] backend.
///
/// Every input bumps a generation counter. A query is only sent if no newer
/// input arrived during the debounce window, and its reply is only shown if
/// it is still the latest input when it comes back (last query wins).
pub struct SearchBox<S> {
    backend: Arc<S>,
    delay: Duration,
    generation: AtomicU64,
    suggestions: Mutex<Vec<Song>>,
}

impl<S: SongSearch> SearchBox<S> {
    pub fn new(backend: Arc<S>) -> Self {
        Self::with_delay(backend, DEBOUNCE)
    }

    pub fn with_delay(backend: Arc<S>, delay: Duration) -> Self {
        SearchBox {
            backend,
            delay,
            generation: AtomicU64::new(0),
            suggestions: Mutex::new(Vec::new()),
        }
    }

    /// Handles one change of the input text.
    ///
    /// Resolves once the input is either superseded, discarded as stale, or
    /// applied to the visible suggestions. Returns `true` only in the last
    /// case.
    pub async fn input(&self, query: &str) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.trim().chars().count() < MIN_QUERY_LEN {
            let mut suggestions = self.suggestions.lock().await;
            if self.is_current(ticket) {
                suggestions.clear();
            }
            return false;
        }

        sleep(self.delay).await;
        if !self.is_current(ticket) {
            debug!(query, "superseded during debounce");
            return false;
        }

        let result = self.backend.search(query).await;

        // Checked under the lock so a newer reply cannot interleave.
        let mut suggestions = self.suggestions.lock().await;
        if !self.is_current(ticket) {
            debug!(query, "discarding stale search reply");
            return false;
        }

        match result {
            Ok(found) => *suggestions = found.songs,
            Err(e) => {
                warn!(query, error = %e, "search failed");
                suggestions.clear();
            }
        }
        true
    }

    pub async fn suggestions(&self) -> Vec<Song> {
        self.suggestions.lock().await.clone()
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

//! # CLI Module
//!
//! Terminal front end for the Predictify proxy. The commands use the same
//! services as the HTTP layer, with the stored [`Session`](crate::session::Session)
//! standing in for the browser's token storage.
//!
//! ## Commands
//!
//! - [`serve`] - runs the HTTP proxy
//! - [`login`] / [`logout`] - authorization-code flow through a local callback
//! - [`dashboard`] - recent and top tracks with their average audio features
//! - [`recommend`] - feature-target recommendations seeded by top tracks
//! - [`search`], [`similar`], [`song`] - song-catalog lookups
//!
//! Results are printed as tables; long calls show a spinner. Fatal errors go
//! through the `error!` console macro and end the process.
//!
//! ## Usage
//!
//! ```bash
//! predictify login
//! predictify dashboard --limit 10
//! predictify recommend
//! predictify search "daft punk"
//! predictify serve --addr 0.0.0.0:3000
//! ```

mod auth;
mod dashboard;
mod serve;
mod songs;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::login;
pub use auth::logout;
pub use dashboard::dashboard;
pub use dashboard::recommend;
pub use serve::serve;
pub use songs::search;
pub use songs::similar;
pub use songs::song;

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

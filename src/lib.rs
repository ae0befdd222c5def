//! Predictify Proxy Library
//!
//! This library implements the server-side layer of the Predictify music
//! recommender: the OAuth authorization-code exchange against Spotify, a
//! bearer-token proxy for the Spotify Web API, a two-hop recommendation proxy
//! in front of the ML backend and a search proxy for the song-catalog backend.
//!
//! # Modules
//!
//! - `api` - HTTP handlers mounted by the proxy server
//! - `catalog` - Song-catalog client and the debounced search box
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Proxy error taxonomy and its HTTP rendering
//! - `logging` - Tracing subscriber setup
//! - `recommend` - Recommendation proxy (direct and feature-target modes)
//! - `server` - Router construction and the HTTP server loop
//! - `session` - Explicit client session and its local persistence
//! - `spotify` - Token exchange and resource proxy for the Spotify APIs
//! - `types` - Data structures and response-shape normalization
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use predictify::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> predictify::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::serve(config, None).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod recommend;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the CLI and server plumbing where errors from several layers
/// (configuration, IO, proxy calls) meet. Library operations that talk to an
/// upstream return [`error::ProxyError`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting proxy on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Logged in as {}", user);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for the binary's top level: the library reports failures
/// through `Result` and never calls this from request handling code.
///
/// # Example
///
/// ```
/// error!("No session found. Run predictify login first.");
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Session expired, refreshing token");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

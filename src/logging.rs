//! Tracing setup for the proxy and the terminal client.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "predictify=info,tower_http=info,warn";

/// Installs the global subscriber.
///
/// The level is controlled through `RUST_LOG`; without it the proxy logs its
/// own events and request traces at `info` and everything else at `warn`.
/// Calling it twice is harmless: the second install is ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Quieter setup for the interactive commands, whose output goes through the
/// colored console macros.
pub fn init_cli_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

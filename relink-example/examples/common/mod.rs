//! Shared helpers for the examples.

use tracing_subscriber::EnvFilter;

/// Initializes logging from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Port shared by the echo server and the reconnect client.
pub fn port() -> u16 {
    std::env::var("RELINK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(7810)
}

//! Logging bootstrap for embedding hosts.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Call once per extension context, before constructing any manager.
/// Respects `RUST_LOG`; defaults to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

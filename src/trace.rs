//! Tracing setup for the listener binary and tests.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The filter defaults to `groupcast=info`; override it via `RUST_LOG`,
/// e.g. `RUST_LOG=groupcast=trace` to see per-datagram records.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; guard with
/// [`std::sync::Once`] when calling from tests.
pub fn init_subscriber() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groupcast=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();
}

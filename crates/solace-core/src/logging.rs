//! Tracing subscriber setup shared by every Solace binary.

use tracing_subscriber::EnvFilter;

/// Build the env filter: `RUST_LOG` wins, otherwise `fallback_level`.
pub fn env_filter(fallback_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level))
}

/// Install the global fmt subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(fallback_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback_level))
        .with_target(false)
        .try_init();
}

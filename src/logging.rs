use std::io;

use tracing_subscriber::{EnvFilter, fmt};

/// Install a compact stderr subscriber.
///
/// Respects `RUST_LOG`; otherwise uses `default_filter`. Safe to call twice,
/// the second call is a no-op.
pub fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

//! Log output.

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG` (default
/// `info`).
///
/// Calling it again, or after another subscriber was installed, does
/// nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
}

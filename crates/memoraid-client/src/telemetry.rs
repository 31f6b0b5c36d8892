//! Tracing setup.

use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is
/// harmless; the second install is ignored.
pub fn init(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

static INIT_TRACING: Once = Once::new();

/// Install the fmt subscriber filtered by `config.log_filter`.
///
/// Only the first call installs anything. `RUST_LOG` wins over the config,
/// and an unparsable directive falls back to `info`.
pub fn init_tracing(config: &ClientConfig) {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init();

        info!(
            "contest client tracing initialized (api port {}, poll {}ms)",
            config.api_port, config.poll_interval_ms
        );
    });
}

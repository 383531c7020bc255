//! # Structured Logging
//!
//! Subscriber setup and span helpers for the tracing ecosystem.

use crate::config::LoggingConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for a single plugin hook invocation
#[macro_export]
macro_rules! plugin_span {
    ($hook:expr, $plugin:expr) => {
        tracing::debug_span!(
            "plugin_hook",
            hook = %$hook,
            plugin = %$plugin,
            node_id = tracing::field::Empty,
            invocation_id = %uuid::Uuid::new_v4()
        )
    };
    ($hook:expr, $plugin:expr, $node_id:expr) => {
        tracing::debug_span!(
            "plugin_hook",
            hook = %$hook,
            plugin = %$plugin,
            node_id = %$node_id,
            invocation_id = %uuid::Uuid::new_v4()
        )
    };
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Installing twice
/// is not an error; the first subscriber stays in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    // A subscriber may already be installed, e.g. by a test harness
    let _ = if config.json_logging {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt().json().with_env_filter(filter).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt().with_env_filter(filter).finish(),
        )
    };

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::Config) {
    tracing::info!(
        service_marker = %config.plugin.service_marker,
        filter_name = %config.plugin.filter_name,
        duplicate_policy = %config.plugin.duplicate_policy,
        cluster_direction = %config.plugin.cluster_direction,
        json_logging = config.logging.json_logging,
        "squashplane configuration"
    );
}

use tracing_subscriber::EnvFilter;

use crate::config::MentionGraphConfig;
use crate::errors::{MentionGraphError, Result};

/// Installs a formatting `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this again once
/// a global subscriber exists is a no-op.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| MentionGraphError::Config {
            message: format!("invalid log filter '{default_filter}': {e}"),
        })?,
    };

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(())
}

/// Installs the subscriber using the configured `log_filter` as the default.
pub fn init_logging_from_config(config: &MentionGraphConfig) -> Result<()> {
    init_logging(&config.log_filter)
}

//! Tracing subscriber setup.

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

use purrito_core::config::GeneralConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `general.log_level` when set.
///
/// # Errors
/// Fails if the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init(general: &GeneralConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_for(&general.log_level)?)
        .with_target(false);

    let installed = if general.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("tracing subscriber already set: {e}"))
}

fn filter_for(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        assert!(filter_for("debug").is_ok());
        assert!(filter_for("info,purrito_core=trace").is_ok());
    }
}

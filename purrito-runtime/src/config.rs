//! Runtime configuration: the engine config plus loop timing.
//!
//! One TOML file carries both. Engine sections (`[pet]`, `[presence]`, ...)
//! sit at the top level next to a `[runtime]` section.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use purrito_core::config::PurritoConfig;
use purrito_core::persistence;
use purrito_core::{Pet, PurritoError, RecordStore, Scope};

/// Top-level configuration for a running pet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Engine settings.
    #[serde(flatten)]
    pub engine: PurritoConfig,
    /// Background loop timing.
    #[serde(default)]
    pub runtime: LoopConfig,
}

impl RuntimeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> purrito_core::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| PurritoError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> purrito_core::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Open the record store named by `[persistence]`. One store serves
    /// every pet in the process.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` for an unknown backend, or the
    /// backend's own error when it cannot open.
    pub fn open_store(&self) -> purrito_core::error::Result<Arc<dyn RecordStore>> {
        persistence::open_store(&self.engine.persistence)
    }

    /// Build the pet for `scope` on `store` with the engine settings.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` when the engine settings are invalid.
    pub fn build_pet(
        &self,
        scope: Scope,
        store: Arc<dyn RecordStore>,
    ) -> purrito_core::error::Result<Arc<Pet>> {
        Pet::builder(scope, store)
            .config(self.engine.clone())
            .build()
            .map(Arc::new)
    }
}

/// How often the loop wakes up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Seconds between presence ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Seconds between decay passes. The first pass runs one full
    /// interval after start.
    #[serde(default = "default_decay_interval_secs")]
    pub decay_interval_secs: u64,
}

fn default_tick_interval_secs() -> u64 {
    5
}
fn default_decay_interval_secs() -> u64 {
    24 * 60 * 60
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            decay_interval_secs: default_decay_interval_secs(),
        }
    }
}

impl LoopConfig {
    /// Presence tick period, never shorter than one second.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    /// Decay period, never shorter than one second.
    #[must_use]
    pub fn decay_interval(&self) -> Duration {
        Duration::from_secs(self.decay_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RuntimeConfig::from_toml("").expect("parse");
        assert_eq!(config.runtime.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.runtime.decay_interval(), Duration::from_secs(86_400));
        assert_eq!(config.engine.pet.name, "purrito");
    }

    #[test]
    fn engine_and_loop_sections_share_one_file() {
        let config = RuntimeConfig::from_toml(
            r#"
            [pet]
            name = "mochi"

            [runtime]
            tick_interval_secs = 0
            decay_interval_secs = 3600
            "#,
        )
        .expect("parse");
        assert_eq!(config.engine.pet.name, "mochi");
        assert_eq!(config.runtime.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.runtime.decay_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn memory_backend_builds_a_pet() {
        let config = RuntimeConfig::from_toml(
            r#"
            [persistence]
            backend = "memory"
            "#,
        )
        .expect("parse");
        let store = config.open_store().expect("store");
        let pet = config
            .build_pet(Scope::new("net", "#cats"), store)
            .expect("pet");
        assert_eq!(pet.name(), "purrito");
    }

    #[test]
    fn unknown_backend_and_bad_timing_are_rejected() {
        let config = RuntimeConfig::from_toml("[persistence]\nbackend = \"redis\"\n").expect("parse");
        assert!(matches!(config.open_store(), Err(PurritoError::Config(_))));

        let config = RuntimeConfig::from_toml(
            "[persistence]\nbackend = \"memory\"\n[presence]\nmin_respawn_secs = 9000000000000000\n",
        )
        .expect("parse");
        let store = config.open_store().expect("store");
        assert!(matches!(
            config.build_pet(Scope::new("net", "#cats"), store),
            Err(PurritoError::Config(_))
        ));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = RuntimeConfig::from_toml("[runtime\n").expect_err("must fail");
        assert!(matches!(err, PurritoError::Config(_)));
    }
}

//! Configuration for the Purrito engine.
//!
//! Maps directly to `purrito.toml`. Every section and field has a default, so
//! an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::clock::DayZone;
use crate::error::Result;

/// Top-level Purrito configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurritoConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Who the pet is and how commands address it.
    #[serde(default)]
    pub pet: PetConfig,
    /// Spawn window and respawn timing.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Action odds, deltas and cooldowns.
    #[serde(default)]
    pub actions: ActionsConfig,
    /// Daily bond rewards.
    #[serde(default)]
    pub bond: BondConfig,
    /// Daily affection decay.
    #[serde(default)]
    pub decay: DecayConfig,
    /// Record store settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl PurritoConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PurritoError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Longest duration any timing setting may name: ten years.
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl PurritoConfig {
    /// Check values that parse fine but cannot drive a pet.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        self.presence.validate()?;
        self.actions.validate()
    }
}

fn config_error(message: String) -> crate::PurritoError {
    crate::PurritoError::Config(message)
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log filter directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Identity of the pet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetConfig {
    /// Name players must target, matched case-insensitively.
    #[serde(default = "default_pet_name")]
    pub name: String,
    /// Leading character stripped from action names and targets.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            name: "purrito".to_string(),
            command_prefix: '!',
        }
    }
}

/// Presence timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// How long one appearance lasts, in seconds.
    #[serde(default = "default_180")]
    pub spawn_window_secs: u64,
    /// Shortest gap before the next appearance, in seconds.
    #[serde(default = "default_600")]
    pub min_respawn_secs: u64,
    /// Longest gap before the next appearance, in seconds.
    #[serde(default = "default_1800")]
    pub max_respawn_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            spawn_window_secs: 180,
            min_respawn_secs: 600,
            max_respawn_secs: 1800,
        }
    }
}

impl PresenceConfig {
    /// Window must be positive, respawn bounds ordered, everything at most
    /// [`MAX_DURATION_SECS`].
    ///
    /// # Errors
    /// Returns `PurritoError::Config` for an out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("presence.spawn_window_secs", self.spawn_window_secs),
            ("presence.min_respawn_secs", self.min_respawn_secs),
            ("presence.max_respawn_secs", self.max_respawn_secs),
        ] {
            if value > MAX_DURATION_SECS {
                return Err(config_error(format!(
                    "{name} = {value} exceeds {MAX_DURATION_SECS}"
                )));
            }
        }
        if self.spawn_window_secs == 0 {
            return Err(config_error("presence.spawn_window_secs must be at least 1".into()));
        }
        if self.min_respawn_secs > self.max_respawn_secs {
            return Err(config_error(format!(
                "presence.min_respawn_secs ({}) is above presence.max_respawn_secs ({})",
                self.min_respawn_secs, self.max_respawn_secs
            )));
        }
        Ok(())
    }
}

/// Action odds and effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Percent chance that pet / feed / laser is accepted.
    #[serde(default = "default_60")]
    pub accept_chance_percent: u8,
    /// Affection gained on an accepted pet / feed / laser.
    #[serde(default = "default_1_i32")]
    pub accept_delta: i32,
    /// Affection lost on a rejected pet / feed / laser.
    #[serde(default = "default_1_i32")]
    pub reject_delta: i32,
    /// Percent chance that catnip goes well.
    #[serde(default = "default_70")]
    pub catnip_success_percent: u8,
    /// Affection gained when catnip goes well.
    #[serde(default = "default_3_i32")]
    pub catnip_bonus: i32,
    /// Affection lost when catnip goes badly.
    #[serde(default = "default_1_i32")]
    pub catnip_penalty: i32,
    /// Per-player catnip cooldown, in hours.
    #[serde(default = "default_24")]
    pub catnip_cooldown_hours: u64,
    /// Affection lost per slap / kick after the first warning.
    #[serde(default = "default_1_i32")]
    pub slap_penalty: i32,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            accept_chance_percent: 60,
            accept_delta: 1,
            reject_delta: 1,
            catnip_success_percent: 70,
            catnip_bonus: 3,
            catnip_penalty: 1,
            catnip_cooldown_hours: 24,
            slap_penalty: 1,
        }
    }
}

impl ActionsConfig {
    /// Catnip cooldown in seconds.
    #[must_use]
    pub fn catnip_cooldown_secs(&self) -> u64 {
        self.catnip_cooldown_hours.saturating_mul(3600)
    }

    /// Percentages at most 100, cooldown at most [`MAX_DURATION_SECS`].
    ///
    /// # Errors
    /// Returns `PurritoError::Config` for an out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("actions.accept_chance_percent", self.accept_chance_percent),
            ("actions.catnip_success_percent", self.catnip_success_percent),
        ] {
            if value > 100 {
                return Err(config_error(format!("{name} = {value} is above 100")));
            }
        }
        if self.catnip_cooldown_secs() > MAX_DURATION_SECS {
            return Err(config_error(format!(
                "actions.catnip_cooldown_hours = {} exceeds {} hours",
                self.catnip_cooldown_hours,
                MAX_DURATION_SECS / 3600
            )));
        }
        Ok(())
    }
}

/// Daily bond rewards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondConfig {
    /// IANA zone whose midnight separates bond days for every player.
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,
    /// Use server-local days when the zone cannot be resolved, instead of
    /// refusing to start. The substitution is logged at warn level.
    #[serde(default)]
    pub allow_local_fallback: bool,
    /// Points awarded on every bonded day.
    #[serde(default = "default_2")]
    pub base_points: u32,
    /// Streak length that earns one extra point per day.
    #[serde(default = "default_7")]
    pub milestone_days: u32,
    /// Cap on the streak bonus.
    #[serde(default = "default_5")]
    pub max_bonus: u32,
}

impl BondConfig {
    /// Resolve the configured reference zone.
    ///
    /// # Errors
    /// Returns `PurritoError::Config` when the zone is unknown and fallback is off.
    pub fn reference_zone(&self) -> Result<DayZone> {
        DayZone::resolve(&self.reference_timezone, self.allow_local_fallback)
    }
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            reference_timezone: "America/New_York".to_string(),
            allow_local_fallback: false,
            base_points: 2,
            milestone_days: 7,
            max_bonus: 5,
        }
    }
}

/// Daily decay of silent bonded players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Affection removed per decay.
    #[serde(default = "default_5_u8")]
    pub amount: u8,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self { amount: 5 }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "sqlite" or "memory".
    #[serde(default = "default_sqlite")]
    pub backend: String,
    /// Path of the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: "purrito.db".to_string(),
            wal_mode: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_pet_name() -> String { "purrito".to_string() }
fn default_command_prefix() -> char { '!' }
fn default_reference_timezone() -> String { "America/New_York".to_string() }
fn default_sqlite() -> String { "sqlite".to_string() }
fn default_db_path() -> String { "purrito.db".to_string() }
fn default_1_i32() -> i32 { 1 }
fn default_3_i32() -> i32 { 3 }
fn default_2() -> u32 { 2 }
fn default_5() -> u32 { 5 }
fn default_5_u8() -> u8 { 5 }
fn default_7() -> u32 { 7 }
fn default_24() -> u64 { 24 }
fn default_60() -> u8 { 60 }
fn default_70() -> u8 { 70 }
fn default_180() -> u64 { 180 }
fn default_600() -> u64 { 600 }
fn default_1800() -> u64 { 1800 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PurritoConfig::from_toml("").expect("parse");
        assert_eq!(config.pet.name, "purrito");
        assert_eq!(config.pet.command_prefix, '!');
        assert_eq!(config.presence.spawn_window_secs, 180);
        assert_eq!(config.actions.accept_chance_percent, 60);
        assert_eq!(config.bond.reference_timezone, "America/New_York");
        assert_eq!(config.decay.amount, 5);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PurritoConfig::from_toml(
            r#"
            [pet]
            name = "Mochi"

            [actions]
            catnip_bonus = 4
            "#,
        )
        .expect("parse");
        assert_eq!(config.pet.name, "Mochi");
        assert_eq!(config.pet.command_prefix, '!');
        assert_eq!(config.actions.catnip_bonus, 4);
        assert_eq!(config.actions.catnip_penalty, 1);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PurritoConfig::from_toml("[pet\nname=").expect_err("invalid");
        assert!(matches!(err, crate::PurritoError::Config(_)));
    }

    #[test]
    fn reference_zone_resolution() {
        let bond = BondConfig {
            reference_timezone: "Nowhere/Special".to_string(),
            ..BondConfig::default()
        };
        assert!(bond.reference_zone().is_err());
        assert!(BondConfig::default().reference_zone().is_ok());
    }

    #[test]
    fn defaults_validate() {
        PurritoConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn huge_or_inverted_presence_timing_is_rejected() {
        let huge = PurritoConfig::from_toml("[presence]\nmin_respawn_secs = 9000000000000000\n")
            .expect("parses");
        assert!(matches!(huge.validate(), Err(crate::PurritoError::Config(_))));

        let inverted = PresenceConfig {
            min_respawn_secs: 900,
            max_respawn_secs: 600,
            ..PresenceConfig::default()
        };
        assert!(inverted.validate().is_err());

        let empty_window = PresenceConfig {
            spawn_window_secs: 0,
            ..PresenceConfig::default()
        };
        assert!(empty_window.validate().is_err());
    }

    #[test]
    fn action_limits_are_checked() {
        let odds = ActionsConfig {
            accept_chance_percent: 101,
            ..ActionsConfig::default()
        };
        assert!(odds.validate().is_err());

        let cooldown = ActionsConfig {
            catnip_cooldown_hours: u64::MAX,
            ..ActionsConfig::default()
        };
        assert!(cooldown.validate().is_err());
        assert_eq!(ActionsConfig::default().catnip_cooldown_secs(), 86_400);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("purrito.toml");
        std::fs::write(&path, "[decay]\namount = 10\n").expect("write");
        let config = PurritoConfig::from_file(&path).expect("load");
        assert_eq!(config.decay.amount, 10);
    }
}

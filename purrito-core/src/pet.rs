//! The pet: one per (network, channel) scope.
//!
//! A [`Pet`] owns all mutable per-instance state (presence window, catnip
//! cooldowns, slap warnings and the dice) behind a single mutex, and shares
//! the record store with every other pet. Store I/O never happens while the
//! mutex is held.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::affection::AffectionStore;
use crate::bond::BondProgression;
use crate::clock::{secs, TimeSource};
use crate::config::PurritoConfig;
use crate::cooldown::CooldownTracker;
use crate::decay::DecayJob;
use crate::dice::{Dice, RandDice};
use crate::error::{PurritoError, Result};
use crate::flavor::{self, fill, pick};
use crate::presence::{PresenceEvent, PresenceScheduler};
use crate::status::{
    rank_players, render_leaderboard, BondView, PresenceView, StatusView,
    DEFAULT_LEADERBOARD_LIMIT,
};
use crate::store::RecordStore;
use crate::types::{normalize_nick, Scope};

/// Mutable state guarded by the pet's mutex.
pub(crate) struct PetState {
    pub(crate) presence: PresenceScheduler,
    pub(crate) catnip: CooldownTracker,
    pub(crate) slap_warned: HashSet<String>,
    pub(crate) dice: Box<dyn Dice>,
}

/// A shared chat pet.
pub struct Pet {
    pub(crate) config: PurritoConfig,
    /// Normalised name targets must match.
    pub(crate) name: String,
    /// Capitalised name used in messages.
    pub(crate) display: String,
    pub(crate) scope: Scope,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) time: TimeSource,
    pub(crate) affection: AffectionStore,
    pub(crate) bond: BondProgression,
    decay: DecayJob,
    pub(crate) state: Mutex<PetState>,
}

impl fmt::Debug for Pet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pet")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl Pet {
    /// Start building a pet for `scope` backed by `store`.
    #[must_use]
    pub fn builder(scope: Scope, store: Arc<dyn RecordStore>) -> PetBuilder {
        PetBuilder {
            scope,
            store,
            config: PurritoConfig::default(),
            time: None,
            dice: None,
        }
    }

    /// Scope this pet lives in.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Normalised pet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PurritoConfig {
        &self.config
    }

    /// Affection accessor for this scope.
    #[must_use]
    pub fn affection(&self) -> &AffectionStore {
        &self.affection
    }

    /// Run an action and return the text to send back. Never fails:
    /// rejections and store trouble both come back as text.
    pub fn execute_action(&self, action: &str, player: &str, target: &str) -> String {
        let outcome = self.resolve(action, player, target);
        debug!(
            scope = %self.scope,
            player = player.trim(),
            kind = ?outcome.kind,
            affection = ?outcome.affection,
            "Action resolved"
        );
        outcome.text
    }

    /// A random idle emote.
    pub fn random_idle_line(&self) -> String {
        let mut state = self.state.lock();
        pick(state.dice.as_mut(), flavor::EMOTES).to_string()
    }

    /// Whether the pet is present now, applying due transitions.
    pub fn is_here(&self) -> bool {
        let now = self.time.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.presence.is_here(now, state.dice.as_mut())
    }

    /// Apply due presence transitions and return one announcement per
    /// queued event.
    pub fn tick_presence(&self) -> Vec<String> {
        let now = self.time.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.presence.refresh(now, state.dice.as_mut());

        let lines: Vec<String> = state
            .presence
            .take_events()
            .into_iter()
            .map(|event| match event {
                PresenceEvent::Spawned => {
                    format!("🐈 meowww ... {}", pick(state.dice.as_mut(), flavor::EMOTES))
                }
                PresenceEvent::WanderedOff => fill(
                    pick(state.dice.as_mut(), flavor::WANDERED_OFF),
                    &[("pet", &self.display)],
                ),
            })
            .collect();
        drop(guard);

        if !lines.is_empty() {
            debug!(scope = %self.scope, events = lines.len(), "Presence announcements");
        }
        lines
    }

    /// Force an appearance of up to `duration` when the pet is away with no
    /// spawn pending.
    pub fn ensure_present(&self, duration: TimeDelta) {
        let now = self.time.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state
            .presence
            .ensure_present(now, duration, state.dice.as_mut());
    }

    /// Send the pet away and cancel any pending spawn.
    pub fn force_absent(&self) {
        self.state.lock().presence.force_absent();
        info!(scope = %self.scope, "Pet forced absent");
    }

    /// Structured status for `player`. Read-only apart from applying due
    /// presence transitions.
    pub fn status_view(&self, player: &str) -> StatusView {
        let player = player.trim();
        let now = self.time.now();
        let (presence, catnip_remaining) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let here = state.presence.is_here(now, state.dice.as_mut());
            let presence = if here {
                PresenceView::Here {
                    leaves_in_secs: state.presence.leaves_in(now).num_seconds(),
                }
            } else {
                PresenceView::Away {
                    back_in_secs: state.presence.back_in(now).map(|wait| wait.num_seconds()),
                }
            };
            (presence, state.catnip.remaining(player, now))
        };

        let key = self.scope.key(player);
        let record = self.store.get(&key).unwrap_or_else(|e| {
            warn!(player = %key, error = %e, "Status read failed");
            None
        });
        let affection = record.as_ref().map_or(0, |r| r.affection);
        let bond = record.as_ref().map(|r| {
            let reference = self.time.reference_now();
            let claimed_today = r
                .last_bond_award_at
                .is_some_and(|at| self.time.reference_zone.same_day(at, reference));
            BondView::from_record(r, claimed_today)
        });

        StatusView::new(
            &self.display,
            player,
            affection,
            presence,
            catnip_remaining.num_seconds(),
            bond,
        )
    }

    /// Status for `player` as one line.
    pub fn status(&self, player: &str) -> String {
        self.status_view(player).to_string()
    }

    /// Status for `player` as JSON.
    ///
    /// # Errors
    /// Returns [`PurritoError::Serialization`] if encoding fails.
    pub fn status_json(&self, player: &str) -> Result<String> {
        serde_json::to_string(&self.status_view(player))
            .map_err(|e| PurritoError::Serialization(e.to_string()))
    }

    /// Run today's decay pass for this scope.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn run_daily_decay(&self) -> Result<Vec<String>> {
        self.decay.run()
    }

    /// Leaderboard of up to `limit` players (clamped to 1..=20), or
    /// [`DEFAULT_LEADERBOARD_LIMIT`] when `None`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<String> {
        let records = self.store.list_in_scope(&self.scope)?;
        let ranked = rank_players(records, limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT));
        Ok(render_leaderboard(&self.display, &ranked))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`Pet`].
pub struct PetBuilder {
    scope: Scope,
    store: Arc<dyn RecordStore>,
    config: PurritoConfig,
    time: Option<TimeSource>,
    dice: Option<Box<dyn Dice>>,
}

impl fmt::Debug for PetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetBuilder")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl PetBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: PurritoConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `time` instead of the wall clock with the configured zone.
    #[must_use]
    pub fn time(mut self, time: TimeSource) -> Self {
        self.time = Some(time);
        self
    }

    /// Use `dice` instead of an entropy-seeded generator.
    #[must_use]
    pub fn dice(mut self, dice: Box<dyn Dice>) -> Self {
        self.dice = Some(dice);
        self
    }

    /// Build the pet. It starts present for one spawn window.
    ///
    /// # Errors
    /// Returns [`PurritoError::Config`] for an empty pet name, an unknown
    /// reference timezone, or timing and odds that fail
    /// [`PurritoConfig::validate`].
    pub fn build(self) -> Result<Pet> {
        self.config.validate()?;
        let name = normalize_nick(&self.config.pet.name);
        if name.is_empty() {
            return Err(PurritoError::Config("pet name must not be empty".into()));
        }
        let display = flavor::display_name(&name);

        let time = match self.time {
            Some(time) => time,
            None => TimeSource::system(self.config.bond.reference_zone()?),
        };
        let dice = self
            .dice
            .unwrap_or_else(|| Box::new(RandDice::from_entropy()));

        let affection = AffectionStore::new(Arc::clone(&self.store), self.scope.clone());
        let bond = BondProgression::new(
            Arc::clone(&self.store),
            self.scope.clone(),
            time.clone(),
            self.config.bond.clone(),
        );
        let decay = DecayJob::new(
            Arc::clone(&self.store),
            self.scope.clone(),
            time.clone(),
            self.config.decay.amount,
            display.clone(),
        );
        let state = PetState {
            presence: PresenceScheduler::new(&self.config.presence, time.now()),
            catnip: CooldownTracker::new(secs(self.config.actions.catnip_cooldown_secs())),
            slap_warned: HashSet::new(),
            dice,
        };

        info!(
            scope = %self.scope,
            pet = %name,
            reference_zone = ?time.reference_zone,
            "Pet created"
        );

        Ok(Pet {
            config: self.config,
            name,
            display,
            scope: self.scope,
            store: self.store,
            time,
            affection,
            bond,
            decay,
            state: Mutex::new(state),
        })
    }
}

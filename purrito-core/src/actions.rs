//! Player actions and their resolution.
//!
//! [`Pet::resolve`] is the whole rulebook: it checks the target, gates on
//! presence and cooldowns, rolls the outcome, applies the affection delta
//! and, for a caring action that leaves the player bonded, claims the day's
//! bond reward. User mistakes are outcomes, never errors.

use std::fmt;

use chrono::TimeDelta;
use serde::Serialize;
use tracing::{debug, warn};

use crate::affection::{render_bar, Mood};
use crate::bond::BondAward;
use crate::clock::format_wait;
use crate::flavor::{self, fill, pick};
use crate::gifts::combined_mask;
use crate::pet::Pet;
use crate::types::{normalize_nick, MAX_AFFECTION};

/// Lowercase, trim, and strip one leading `prefix` from a command word.
#[must_use]
pub fn normalize_command(raw: &str, prefix: char) -> String {
    let lowered = raw.trim().to_lowercase();
    lowered
        .strip_prefix(prefix)
        .map_or_else(|| lowered.clone(), str::to_string)
}

/// A parsed action word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `pet`.
    Pet,
    /// `love`, same rules as `pet`.
    Love,
    /// `feed`.
    Feed,
    /// `laser`.
    Laser,
    /// `catnip`, cooldown-gated.
    Catnip,
    /// `slap`.
    Slap,
    /// `kick`, same rules as `slap`.
    Kick,
    /// `status`, read-only.
    Status,
    /// Anything else.
    Unknown(String),
}

impl Action {
    /// Parse a raw action word such as `"!Pet"`.
    #[must_use]
    pub fn parse(raw: &str, prefix: char) -> Self {
        match normalize_command(raw, prefix).as_str() {
            "pet" => Self::Pet,
            "love" => Self::Love,
            "feed" => Self::Feed,
            "laser" => Self::Laser,
            "catnip" => Self::Catnip,
            "slap" => Self::Slap,
            "kick" => Self::Kick,
            "status" => Self::Status,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Normalised action word.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Pet => "pet",
            Self::Love => "love",
            Self::Feed => "feed",
            Self::Laser => "laser",
            Self::Catnip => "catnip",
            Self::Slap => "slap",
            Self::Kick => "kick",
            Self::Status => "status",
            Self::Unknown(word) => word,
        }
    }

    /// Whether the pet must be present (and is consumed by the action).
    #[must_use]
    pub fn needs_presence(&self) -> bool {
        matches!(
            self,
            Self::Pet | Self::Love | Self::Feed | Self::Laser | Self::Catnip
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened, independent of the flavor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The pet liked it.
    Accepted,
    /// The pet did not.
    Rejected,
    /// The pet is away.
    NotHere,
    /// Catnip used too recently.
    OnCooldown,
    /// Aimed at someone other than the pet.
    Misuse,
    /// First slap / kick.
    Warned,
    /// Later slap / kick.
    Punished,
    /// Unknown action.
    Confused,
    /// Status view.
    Status,
}

/// Result of one action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Classification.
    pub kind: OutcomeKind,
    /// Text to send back to the channel.
    pub text: String,
    /// Affection after the action, when it touched affection.
    pub affection: Option<u8>,
    /// Bond reward claimed by the action, if any.
    pub bond: Option<BondAward>,
}

impl ActionOutcome {
    fn plain(kind: OutcomeKind, text: String) -> Self {
        Self {
            kind,
            text,
            affection: None,
            bond: None,
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Which template pool and delta a presence-gated action resolved to.
struct Roll {
    kind: OutcomeKind,
    template: &'static str,
    emote: &'static str,
    food: &'static str,
    delta: i32,
}

/// Decision taken under the state lock for a presence-gated action.
enum Gate {
    /// Absent; the wait is `None` when no return is scheduled.
    Away(Option<TimeDelta>),
    Cooling(TimeDelta),
    Go(Roll),
}

impl Pet {
    /// Resolve an action into a full outcome.
    pub fn resolve(&self, action: &str, player: &str, target: &str) -> ActionOutcome {
        let prefix = self.config.pet.command_prefix;
        let action = Action::parse(action, prefix);
        let player = player.trim();

        if action == Action::Status {
            return ActionOutcome::plain(OutcomeKind::Status, self.status(player));
        }

        let aimed = normalize_command(target, prefix);
        if aimed != self.name {
            let text = {
                let mut state = self.state.lock();
                flavor::misuse_line(
                    state.dice.as_mut(),
                    &self.display,
                    &self.name,
                    action.name(),
                    player,
                    target.trim(),
                )
            };
            debug!(player, action = %action, target = %aimed, "Action aimed elsewhere");
            return ActionOutcome::plain(OutcomeKind::Misuse, text);
        }

        match action {
            Action::Pet | Action::Love | Action::Feed | Action::Laser => {
                self.resolve_caring(&action, player)
            }
            Action::Catnip => self.resolve_catnip(player),
            Action::Slap | Action::Kick => self.resolve_slap(player),
            Action::Status | Action::Unknown(_) => ActionOutcome::plain(
                OutcomeKind::Confused,
                fill(flavor::CONFUSED, &[("pet", &self.display)]),
            ),
        }
    }

    fn resolve_caring(&self, action: &Action, player: &str) -> ActionOutcome {
        let actions = &self.config.actions;
        let gate = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let now = self.time.now();
            let dice = state.dice.as_mut();
            if state.presence.consume(now, dice) {
                let accepted = dice.percent() < actions.accept_chance_percent;
                let food = pick(dice, flavor::FOODS);
                let (accept_pool, reject_pool) = match action {
                    Action::Feed => (flavor::FEED_ACCEPT, flavor::FEED_REJECT),
                    Action::Laser => (flavor::LASER_ACCEPT, flavor::LASER_REJECT),
                    _ => (flavor::PET_ACCEPT, flavor::PET_REJECT),
                };
                Gate::Go(if accepted {
                    Roll {
                        kind: OutcomeKind::Accepted,
                        template: pick(dice, accept_pool),
                        emote: pick(dice, flavor::EMOTES),
                        food,
                        delta: actions.accept_delta,
                    }
                } else {
                    Roll {
                        kind: OutcomeKind::Rejected,
                        template: pick(dice, reject_pool),
                        emote: pick(dice, flavor::REJECTS),
                        food,
                        delta: -actions.reject_delta,
                    }
                })
            } else {
                Gate::Away(state.presence.back_in(now))
            }
        };
        self.finish(player, gate)
    }

    fn resolve_catnip(&self, player: &str) -> ActionOutcome {
        let actions = &self.config.actions;
        let gate = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let now = self.time.now();
            let dice = state.dice.as_mut();
            if !state.presence.consume(now, dice) {
                Gate::Away(state.presence.back_in(now))
            } else if state.catnip.is_on_cooldown(player, now) {
                Gate::Cooling(state.catnip.remaining(player, now))
            } else {
                state.catnip.record(player, now);
                Gate::Go(if dice.percent() < actions.catnip_success_percent {
                    Roll {
                        kind: OutcomeKind::Accepted,
                        template: pick(dice, flavor::CATNIP_GOOD),
                        emote: "",
                        food: "",
                        delta: actions.catnip_bonus,
                    }
                } else {
                    Roll {
                        kind: OutcomeKind::Rejected,
                        template: pick(dice, flavor::CATNIP_BAD),
                        emote: "",
                        food: "",
                        delta: -actions.catnip_penalty,
                    }
                })
            }
        };
        self.finish(player, gate)
    }

    /// Turn a gate decision into an outcome. Runs with the state lock
    /// released, since every branch but `Away` writes to the store.
    fn finish(&self, player: &str, gate: Gate) -> ActionOutcome {
        match gate {
            Gate::Away(Some(wait)) => ActionOutcome::plain(
                OutcomeKind::NotHere,
                fill(
                    flavor::NOT_HERE,
                    &[("pet", &self.display), ("wait", &format_wait(wait))],
                ),
            ),
            Gate::Away(None) => ActionOutcome::plain(
                OutcomeKind::NotHere,
                fill(flavor::NOT_HERE_UNSCHEDULED, &[("pet", &self.display)]),
            ),
            Gate::Cooling(remaining) => {
                self.touch(player);
                let wait = format_wait(remaining);
                debug!(player, wait = %wait, "Catnip on cooldown");
                ActionOutcome::plain(
                    OutcomeKind::OnCooldown,
                    fill(flavor::CATNIP_COOLDOWN, &[("player", player), ("wait", &wait)]),
                )
            }
            Gate::Go(roll) => {
                self.touch(player);
                self.apply_roll(player, &roll)
            }
        }
    }

    fn resolve_slap(&self, player: &str) -> ActionOutcome {
        let (warned_before, template) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let first = state.slap_warned.insert(normalize_nick(player));
            let pool = if first {
                flavor::SLAP_WARNING
            } else {
                flavor::SLAP_PUNISH
            };
            (!first, pick(state.dice.as_mut(), pool))
        };

        if !warned_before {
            return ActionOutcome::plain(
                OutcomeKind::Warned,
                fill(template, &[("pet", &self.display), ("player", player)]),
            );
        }

        let Some(affection) = self.write_affection(player, -self.config.actions.slap_penalty)
        else {
            return self.distracted(OutcomeKind::Punished);
        };
        ActionOutcome {
            kind: OutcomeKind::Punished,
            text: self.meter_text(template, player, affection, "", ""),
            affection: Some(affection),
            bond: None,
        }
    }

    /// Apply a rolled caring outcome: affection, text, then any bond reward.
    fn apply_roll(&self, player: &str, roll: &Roll) -> ActionOutcome {
        let Some(affection) = self.write_affection(player, roll.delta) else {
            return self.distracted(roll.kind);
        };
        let mut text = self.meter_text(roll.template, player, affection, roll.emote, roll.food);

        let bond = if affection == MAX_AFFECTION {
            self.claim_bond(player)
        } else {
            None
        };
        if let Some(award) = &bond {
            text.push_str(&award.suffix());
        }

        ActionOutcome {
            kind: roll.kind,
            text,
            affection: Some(affection),
            bond,
        }
    }

    fn claim_bond(&self, player: &str) -> Option<BondAward> {
        let award = match self.bond.record_bonded_interaction(player) {
            Ok(award) => award,
            Err(e) => {
                warn!(player, error = %e, "Bond progression failed, dropping suffix");
                return None;
            }
        };
        if !award.gifts_unlocked.is_empty() {
            let key = self.scope.key(player);
            if let Err(e) = self
                .store
                .add_gifts_unlocked(&key, combined_mask(&award.gifts_unlocked))
            {
                warn!(player = %key, error = %e, "Failed to record unlocked gifts");
            }
        }
        Some(award)
    }

    /// `None` when the store failed; the record is then left as it was.
    fn write_affection(&self, player: &str, delta: i32) -> Option<u8> {
        match self.affection.adjust(player, delta) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(player, delta, error = %e, "Affection update failed");
                None
            }
        }
    }

    fn distracted(&self, kind: OutcomeKind) -> ActionOutcome {
        ActionOutcome::plain(kind, fill(flavor::DISTRACTED, &[("pet", &self.display)]))
    }

    fn touch(&self, player: &str) {
        let key = self.scope.key(player);
        if let Err(e) = self.store.touch_interaction(&key, self.time.now()) {
            warn!(player = %key, error = %e, "Failed to stamp interaction");
        }
    }

    fn meter_text(
        &self,
        template: &str,
        player: &str,
        affection: u8,
        emote: &str,
        food: &str,
    ) -> String {
        let love = affection.to_string();
        let mood = Mood::from_affection(affection).label();
        let bar = render_bar(affection);
        fill(
            template,
            &[
                ("pet", &self.display),
                ("player", player),
                ("emote", emote),
                ("food", food),
                ("love", &love),
                ("mood", mood),
                ("bar", &bar),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_normalisation() {
        assert_eq!(normalize_command("  !PET ", '!'), "pet");
        assert_eq!(normalize_command("!!pet", '!'), "!pet");
        assert_eq!(normalize_command("Purrito", '!'), "purrito");
        assert_eq!(normalize_command(".feed", '.'), "feed");
    }

    #[test]
    fn parse_known_and_unknown() {
        assert_eq!(Action::parse("!love", '!'), Action::Love);
        assert_eq!(Action::parse("KICK", '!'), Action::Kick);
        assert_eq!(Action::parse("!dance", '!'), Action::Unknown("dance".into()));
        assert!(Action::Catnip.needs_presence());
        assert!(!Action::Slap.needs_presence());
        assert!(!Action::Status.needs_presence());
    }
}

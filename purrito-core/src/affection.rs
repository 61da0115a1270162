//! Per-player affection: clamped score, mood classification and love bar.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{clamp_affection, PlayerKey, Scope, MAX_AFFECTION};

/// Rendering of a bonded (100%) player's bar.
pub const BONDED_BAR: &str = "[❤️✨❤️✨❤️✨❤️✨❤️]";

const BAR_SEGMENTS: u8 = 10;

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// How the pet feels about a player, derived from affection alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mood {
    /// Affection exactly 0.
    Hostile,
    /// 1..20.
    Sad,
    /// 20..50.
    Cautious,
    /// 50..80.
    Friendly,
    /// 80 and above.
    Adoring,
}

impl Mood {
    /// Classify an affection value.
    #[must_use]
    pub fn from_affection(affection: u8) -> Self {
        match affection {
            0 => Self::Hostile,
            1..20 => Self::Sad,
            20..50 => Self::Cautious,
            50..80 => Self::Friendly,
            _ => Self::Adoring,
        }
    }

    /// Ordinal rank; non-decreasing in affection.
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Display label with emoji.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hostile => "hostile 😾",
            Self::Sad => "sad 😿",
            Self::Cautious => "cautious 😼",
            Self::Friendly => "friendly 😺",
            Self::Adoring => "loves you 😻",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Render the ten-segment love bar for `affection`.
#[must_use]
pub fn render_bar(affection: u8) -> String {
    let affection = affection.min(MAX_AFFECTION);
    if affection == MAX_AFFECTION {
        return BONDED_BAR.to_string();
    }
    let filled = usize::from(affection / BAR_SEGMENTS);
    let empty = usize::from(BAR_SEGMENTS) - filled;
    format!("[{}{}]", "❤️".repeat(filled), "░".repeat(empty))
}

/// `"<n>% <mood> <bar>"`, the meter shown after every affection change.
#[must_use]
pub fn meter_line(affection: u8) -> String {
    format!(
        "{affection}% {} {}",
        Mood::from_affection(affection),
        render_bar(affection)
    )
}

// ---------------------------------------------------------------------------
// AffectionStore
// ---------------------------------------------------------------------------

/// Affection reads and writes for one scope.
#[derive(Clone)]
pub struct AffectionStore {
    store: Arc<dyn RecordStore>,
    scope: Scope,
}

impl fmt::Debug for AffectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffectionStore")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl AffectionStore {
    /// Affection for players in `scope`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    /// Scope this store reads and writes.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Add `delta` (may be negative), clamp, persist, and return the new value.
    ///
    /// # Errors
    /// Propagates store read and write failures. A failed read writes
    /// nothing.
    pub fn adjust(&self, player: &str, delta: i32) -> Result<u8> {
        let key = self.scope.key(player);
        let before = self
            .store
            .get(&key)?
            .map_or(0, |r| r.affection.min(MAX_AFFECTION));
        let after = clamp_affection(i64::from(before) + i64::from(delta));
        self.store.upsert_affection(&key, after)?;
        debug!(player = %key, before, after, delta, "Affection adjusted");
        Ok(after)
    }

    /// Raise affection by `amount`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn increase(&self, player: &str, amount: u32) -> Result<u8> {
        self.adjust(player, i32::try_from(amount).unwrap_or(i32::MAX))
    }

    /// Lower affection by `amount`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn decrease(&self, player: &str, amount: u32) -> Result<u8> {
        self.adjust(player, -i32::try_from(amount).unwrap_or(i32::MAX))
    }

    /// Current affection; 0 for unknown players or when the read fails.
    #[must_use]
    pub fn get(&self, player: &str) -> u8 {
        self.read(&self.scope.key(player))
    }

    /// Current mood.
    #[must_use]
    pub fn mood(&self, player: &str) -> Mood {
        Mood::from_affection(self.get(player))
    }

    /// Current love bar.
    #[must_use]
    pub fn bar(&self, player: &str) -> String {
        render_bar(self.get(player))
    }

    /// `"<n>% <mood> <bar>"` for the player's current affection.
    #[must_use]
    pub fn status_line(&self, player: &str) -> String {
        meter_line(self.get(player))
    }

    fn read(&self, key: &PlayerKey) -> u8 {
        match self.store.get(key) {
            Ok(record) => record.map_or(0, |r| r.affection.min(MAX_AFFECTION)),
            Err(e) => {
                warn!(player = %key, error = %e, "Affection read failed, assuming 0");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn affection() -> AffectionStore {
        AffectionStore::new(Arc::new(MemoryStore::new()), Scope::new("net", "#chan"))
    }

    #[test]
    fn mood_thresholds() {
        assert_eq!(Mood::from_affection(0), Mood::Hostile);
        assert_eq!(Mood::from_affection(1), Mood::Sad);
        assert_eq!(Mood::from_affection(19), Mood::Sad);
        assert_eq!(Mood::from_affection(20), Mood::Cautious);
        assert_eq!(Mood::from_affection(49), Mood::Cautious);
        assert_eq!(Mood::from_affection(50), Mood::Friendly);
        assert_eq!(Mood::from_affection(79), Mood::Friendly);
        assert_eq!(Mood::from_affection(80), Mood::Adoring);
        assert_eq!(Mood::from_affection(100), Mood::Adoring);
    }

    #[test]
    fn bar_rendering() {
        assert_eq!(render_bar(0), "[░░░░░░░░░░]");
        assert_eq!(render_bar(37), "[❤️❤️❤️░░░░░░░]");
        assert_eq!(render_bar(99), "[❤️❤️❤️❤️❤️❤️❤️❤️❤️░]");
        assert_eq!(render_bar(100), BONDED_BAR);
    }

    #[test]
    fn unknown_player_reads_zero() {
        let store = affection();
        assert_eq!(store.get("nobody"), 0);
        assert_eq!(store.mood("nobody"), Mood::Hostile);
    }

    #[test]
    fn adjustments_clamp() {
        let store = affection();
        assert_eq!(store.decrease("alice", 5).expect("dec"), 0);
        assert_eq!(store.increase("alice", 250).expect("inc"), 100);
        assert_eq!(store.increase("alice", 1).expect("inc"), 100);
        assert_eq!(store.adjust("alice", -3).expect("adj"), 97);
        assert_eq!(store.get("ALICE"), 97);
    }

    #[test]
    fn status_line_format() {
        let store = affection();
        store.increase("bob", 55).expect("inc");
        assert_eq!(
            store.status_line("bob"),
            "55% friendly 😺 [❤️❤️❤️❤️❤️░░░░░]"
        );
    }
}

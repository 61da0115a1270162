//! Core type definitions for the Purrito engine.
//!
//! All persisted types are serializable; identity types normalise on
//! construction so two spellings of the same nick land on the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Highest affection a player can reach.
pub const MAX_AFFECTION: u8 = 100;

/// Nick-mode prefixes a chat network may put in front of a nick.
const NICK_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

/// Normalise a player nick: trim, lowercase, strip leading mode prefixes.
#[must_use]
pub fn normalize_nick(nick: &str) -> String {
    nick.trim()
        .to_lowercase()
        .trim_start_matches(NICK_PREFIXES)
        .to_string()
}

/// Clamp any signed affection value into `0..=100`.
#[must_use]
pub fn clamp_affection(value: i64) -> u8 {
    // The clamp makes the narrowing cast lossless.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = value.clamp(0, i64::from(MAX_AFFECTION)) as u8;
    clamped
}

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// A (network, channel) pair. Each scope has its own pet and its own records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Chat network name.
    pub network: String,
    /// Channel name on that network.
    pub channel: String,
}

impl Scope {
    /// Create a scope; the channel is lowercased since chat channels are
    /// case-insensitive.
    #[must_use]
    pub fn new(network: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            channel: channel.into().to_lowercase(),
        }
    }

    /// Identity key for `player` in this scope.
    #[must_use]
    pub fn key(&self, player: &str) -> PlayerKey {
        PlayerKey::new(player, self.clone())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.channel)
    }
}

/// Identity of a player record: normalised nick plus scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    /// Normalised nick (see [`normalize_nick`]).
    pub name: String,
    /// Scope the record belongs to.
    pub scope: Scope,
}

impl PlayerKey {
    /// Build a key, normalising the nick.
    #[must_use]
    pub fn new(nick: &str, scope: Scope) -> Self {
        Self {
            name: normalize_nick(nick),
            scope,
        }
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.scope)
    }
}

// ---------------------------------------------------------------------------
// Gift bitmask
// ---------------------------------------------------------------------------

/// Bitmask of unlocked gifts. Bits are only ever added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GiftMask(pub u32);

impl GiftMask {
    /// No gifts.
    pub const EMPTY: Self = Self(0);

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for GiftMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GiftMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Player record
// ---------------------------------------------------------------------------

/// Everything the engine persists about one player in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Identity.
    pub key: PlayerKey,
    /// Affection toward the pet, `0..=100`.
    pub affection: u8,
    /// Last time the player reached the pet with a caring action.
    pub last_interacted_at: Option<DateTime<Utc>>,
    /// Last time the daily decay hit this record.
    pub last_decay_at: Option<DateTime<Utc>>,
    /// Current run of consecutive reference-days with a bond award.
    pub bond_streak: u32,
    /// Longest bond streak ever reached. Never decreases.
    pub highest_bond_streak: u32,
    /// Last time a bond award was granted.
    pub last_bond_award_at: Option<DateTime<Utc>>,
    /// Lifetime bond points. Only ever incremented.
    pub bond_points: u32,
    /// Whether the one-time "perfect bond fading" warning was sent.
    pub perfect_drop_warned: bool,
    /// Unlocked gifts.
    pub gifts_unlocked: GiftMask,
}

impl PlayerRecord {
    /// A fresh record with zero defaults, as created on first write.
    #[must_use]
    pub fn new(key: PlayerKey) -> Self {
        Self {
            key,
            affection: 0,
            last_interacted_at: None,
            last_decay_at: None,
            bond_streak: 0,
            highest_bond_streak: 0,
            last_bond_award_at: None,
            bond_points: 0,
            perfect_drop_warned: false,
            gifts_unlocked: GiftMask::EMPTY,
        }
    }

    /// Whether the player is bonded (affection at the maximum).
    #[must_use]
    pub fn is_bonded(&self) -> bool {
        self.affection >= MAX_AFFECTION
    }
}

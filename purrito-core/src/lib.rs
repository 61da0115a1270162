//! # Purrito Core Library
//!
//! Game-state engine for a shared chat pet.
//!
//! One [`Pet`] lives in each (network, channel) scope. It wanders in and out
//! on a timer, and players spend its brief appearances trying to win it over:
//!
//! - **Affection** — per-player 0–100 score, mood and love bar
//! - **Presence** — spawn/despawn state machine, one interaction per visit
//! - **Actions** — pet, feed, laser, catnip and slap with weighted outcomes
//! - **Bonds** — once-per-day rewards for players at 100%, streaks and gifts
//! - **Decay** — bonded players who go silent for a day start to fade
//!
//! Everything the engine persists goes through a [`RecordStore`]; everything
//! it randomises goes through [`Dice`]; every instant comes from a [`Clock`].

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actions;
pub mod affection;
pub mod bond;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod decay;
pub mod dice;
pub mod error;
pub mod flavor;
pub mod gifts;
pub mod persistence;
pub mod pet;
pub mod presence;
pub mod status;
pub mod store;
pub mod types;

pub use actions::{Action, ActionOutcome, OutcomeKind};
pub use clock::{Clock, DayZone, ManualClock, SystemClock, TimeSource};
pub use config::PurritoConfig;
pub use dice::{Dice, RandDice, ScriptedDice};
pub use error::PurritoError;
pub use pet::{Pet, PetBuilder};
pub use store::{MemoryStore, RecordStore};
pub use types::*;

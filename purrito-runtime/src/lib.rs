//! # Purrito Runtime
//!
//! Drives a [`purrito_core::Pet`] in the background: presence ticks turn
//! spawn and wander-off transitions into chat announcements, and a daily
//! pass decays bonded players who stayed away.
//!
//! The engine itself is synchronous and store-backed, so every engine call
//! from the loop runs on the blocking pool. Announcements leave through a
//! [`MessageSink`], which keeps the chat transport out of this crate.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod runtime;
pub mod sink;
pub mod telemetry;

pub use config::{LoopConfig, RuntimeConfig};
pub use runtime::{PetRuntime, RuntimeStats};
pub use sink::{Announcement, ChannelSink, LogSink, MessageSink};

//! Injectable randomness.
//!
//! Every random decision in the engine (accept/reject rolls, respawn gaps,
//! flavor-text picks) goes through [`Dice`], so tests can pin exact rolls
//! with [`ScriptedDice`] instead of hunting for a lucky seed.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of random decisions.
pub trait Dice: Send {
    /// Uniform roll in `0..100`.
    fn percent(&mut self) -> u8;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform value in `min..max`, or `min` when the range is empty.
    fn between(&mut self, min: u64, max: u64) -> u64;
}

/// [`Dice`] backed by any [`rand`] generator.
#[derive(Debug, Clone)]
pub struct RandDice<R> {
    rng: R,
}

impl<R: Rng> RandDice<R> {
    /// Wrap a generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandDice<StdRng> {
    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator for replays.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> Dice for RandDice<R> {
    fn percent(&mut self) -> u8 {
        self.rng.gen_range(0..100)
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Dice that replay queued values, falling back to fixed defaults once a
/// queue runs dry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    percents: VecDeque<u8>,
    indices: VecDeque<usize>,
    gaps: VecDeque<u64>,
    default_percent: u8,
}

impl ScriptedDice {
    /// Dice whose every percent roll is `percent`, every index 0 and every
    /// gap the range minimum.
    #[must_use]
    pub fn always(percent: u8) -> Self {
        Self {
            default_percent: percent,
            ..Self::default()
        }
    }

    /// Queue percent rolls.
    #[must_use]
    pub fn with_percents(mut self, rolls: impl IntoIterator<Item = u8>) -> Self {
        self.percents.extend(rolls);
        self
    }

    /// Queue index picks.
    #[must_use]
    pub fn with_indices(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(picks);
        self
    }

    /// Queue respawn gaps (clamped into the requested range).
    #[must_use]
    pub fn with_gaps(mut self, gaps: impl IntoIterator<Item = u64>) -> Self {
        self.gaps.extend(gaps);
        self
    }
}

impl Dice for ScriptedDice {
    fn percent(&mut self) -> u8 {
        self.percents
            .pop_front()
            .unwrap_or(self.default_percent)
            .min(99)
    }

    fn index(&mut self, len: usize) -> usize {
        let pick = self.indices.pop_front().unwrap_or(0);
        pick % len.max(1)
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        match self.gaps.pop_front() {
            Some(gap) if max > min => gap.clamp(min, max - 1),
            _ => min,
        }
    }
}

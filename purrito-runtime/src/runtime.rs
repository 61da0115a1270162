//! Background loop for one pet.
//!
//! Each [`PetRuntime`] owns a tokio task that wakes on two timers:
//!
//! - **presence tick** (seconds): applies due spawn/despawn transitions and
//!   announces them
//! - **decay** (daily): runs the decay pass and announces fading bonds
//!
//! Both engine calls touch the record store, so they run via
//! `spawn_blocking`. A watch channel carries the shutdown signal; dropping
//! the handle without calling [`PetRuntime::shutdown`] also stops the loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use purrito_core::{Pet, Scope};

use crate::config::LoopConfig;
use crate::sink::MessageSink;

/// Counters for one running loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Presence ticks completed.
    pub ticks: u64,
    /// Decay passes that finished without error.
    pub decay_passes: u64,
    /// Decay passes aborted by a store error.
    pub decay_failures: u64,
    /// Lines handed to the sink.
    pub announcements: u64,
}

/// Handle to a pet's background task.
pub struct PetRuntime {
    scope: Scope,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: Arc<Mutex<RuntimeStats>>,
}

impl fmt::Debug for PetRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetRuntime")
            .field("scope", &self.scope)
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl PetRuntime {
    /// Start the loop for `pet`. Must be called from within a tokio runtime.
    ///
    /// The first presence tick fires immediately, so a freshly built pet
    /// announces its spawn right away. The first decay pass waits one full
    /// decay interval.
    #[must_use]
    pub fn spawn(pet: Arc<Pet>, sink: Arc<dyn MessageSink>, config: &LoopConfig) -> Self {
        let scope = pet.scope().clone();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(RuntimeStats::default()));

        let worker = Worker {
            pet,
            sink,
            stats: Arc::clone(&stats),
        };
        let task = tokio::spawn(worker.run(
            config.tick_interval(),
            config.decay_interval(),
            shutdown_rx,
        ));

        info!(
            scope = %scope,
            tick_secs = config.tick_interval().as_secs(),
            decay_secs = config.decay_interval().as_secs(),
            "Pet runtime started"
        );

        Self {
            scope,
            shutdown,
            task,
            stats,
        }
    }

    /// Scope of the pet this loop drives.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Snapshot of the loop counters.
    #[must_use]
    pub fn stats(&self) -> RuntimeStats {
        *self.stats.lock()
    }

    /// Whether the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it.
    ///
    /// An engine call already in flight completes first.
    ///
    /// # Errors
    /// Returns an error if the loop task panicked or was cancelled.
    pub async fn shutdown(self) -> anyhow::Result<RuntimeStats> {
        // Err only when the loop already exited and dropped its receiver.
        let _ = self.shutdown.send(true);
        self.task
            .await
            .with_context(|| format!("pet loop for {} did not exit cleanly", self.scope))?;
        let stats = *self.stats.lock();
        info!(scope = %self.scope, ?stats, "Pet runtime stopped");
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Loop body
// ---------------------------------------------------------------------------

struct Worker {
    pet: Arc<Pet>,
    sink: Arc<dyn MessageSink>,
    stats: Arc<Mutex<RuntimeStats>>,
}

impl Worker {
    async fn run(
        self,
        tick_every: Duration,
        decay_every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut tick = time::interval(tick_every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut decay = time::interval_at(Instant::now() + decay_every, decay_every);
        decay.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tick.tick() => self.presence_tick().await,
                _ = decay.tick() => self.decay_pass().await,
            }
        }
        debug!(scope = %self.pet.scope(), "Pet loop exiting");
    }

    async fn presence_tick(&self) {
        let pet = Arc::clone(&self.pet);
        match task::spawn_blocking(move || pet.tick_presence()).await {
            Ok(lines) => {
                self.stats.lock().ticks += 1;
                self.deliver(&lines);
            }
            Err(e) => error!(scope = %self.pet.scope(), error = %e, "Presence tick panicked"),
        }
    }

    async fn decay_pass(&self) {
        let pet = Arc::clone(&self.pet);
        match task::spawn_blocking(move || pet.run_daily_decay()).await {
            Ok(Ok(lines)) => {
                self.stats.lock().decay_passes += 1;
                self.deliver(&lines);
            }
            Ok(Err(e)) => {
                self.stats.lock().decay_failures += 1;
                error!(scope = %self.pet.scope(), error = %e, "Daily decay failed");
            }
            Err(e) => error!(scope = %self.pet.scope(), error = %e, "Daily decay panicked"),
        }
    }

    fn deliver(&self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let scope = self.pet.scope();
        for line in lines {
            self.sink.send(scope, line);
        }
        self.stats.lock().announcements += lines.len() as u64;
    }
}

//! Periodic task runner.
//!
//! # Responsibilities
//! - Run named tasks on a fixed cadence, independent of request traffic
//! - Stop every task on the shutdown signal
//!
//! # Design Decisions
//! - Each run is awaited before the next tick is considered, so runs of the
//!   same task never overlap
//! - Ticks that come due while a run is still going are skipped
//!   (`MissedTickBehavior::Skip`), not queued
//! - The first run happens one full cadence after the task is added
//! - A run in progress when shutdown arrives is abandoned

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::Shutdown;

/// Shortest cadence a task may run at.
pub const MIN_CADENCE: Duration = Duration::from_millis(10);

/// Owns the background tasks of the host.
pub struct Scheduler {
    shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new(shutdown: Shutdown) -> Self {
        Self {
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Register `task` to run every `cadence` under `name`.
    ///
    /// A cadence below [`MIN_CADENCE`] is raised to it.
    pub fn add<F, Fut>(&mut self, name: &'static str, cadence: Duration, task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_triggered() {
            tracing::warn!(task = name, "Shutdown already triggered, not scheduling task");
            return;
        }
        let cadence = if cadence < MIN_CADENCE {
            tracing::warn!(
                task = name,
                requested_ms = cadence.as_millis() as u64,
                "Cadence too short, using minimum"
            );
            MIN_CADENCE
        } else {
            cadence
        };
        tracing::info!(task = name, cadence_secs = cadence.as_secs(), "Scheduling periodic task");
        let handle = tokio::spawn(run_periodic(name, cadence, self.shutdown.subscribe(), task));
        self.tasks.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task to stop. Call after triggering shutdown.
    pub async fn join(self) {
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "Periodic task ended abnormally");
            }
        }
    }
}

async fn run_periodic<F, Fut>(
    name: &'static str,
    cadence: Duration,
    mut shutdown: broadcast::Receiver<()>,
    mut task: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + cadence, cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    _ = task() => {}
                    _ = shutdown.recv() => {
                        tracing::info!(task = name, "Shutdown during run, abandoning it");
                        break;
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!(task = name, "Periodic task received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

//! Fixed-cadence repeating tasks for Delveforge.
//!
//! A [`RepeatingTask`] is a stable "every N milliseconds" timer that a
//! game task awaits inside its own loop. It replaces callbacks that
//! re-submit themselves to a scheduler: the cadence lives in one value,
//! the task can be paused, and it can never end up scheduled twice.
//!
//! # Disabled mode
//!
//! A task built with no interval never fires; [`RepeatingTask::wait_for_tick`]
//! pends forever. Services use this to switch a periodic job off without
//! restructuring their loop.
//!
//! # Integration
//!
//! The task sits in the game task's `tokio::select!` loop next to the
//! command queue, so its work is serialised with everything else:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = sweep.wait_for_tick() => {
//!             manager.sweep_expired(&mut world);
//!             sweep.record_run_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the task wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissedTickPolicy {
    /// Forget the missed runs and schedule the next one a full interval
    /// from now.
    #[default]
    Skip,
    /// Keep the original cadence. The next run is due one interval after
    /// the one that was missed, which may already be in the past.
    Fixed,
}

/// Configuration for a [`RepeatingTask`].
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Time between runs. `None` disables the task.
    pub interval: Option<Duration>,
    pub policy: MissedTickPolicy,
    /// Random delay (0..max) added to the first run only, so tasks
    /// started together do not all fire on the same tick.
    pub initial_jitter: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            interval: None,
            policy: MissedTickPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TaskConfig {
    /// Shortest interval a task may run at.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A task that runs every `interval`.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// A task that runs every `ms` milliseconds. `0` disables it.
    pub fn every_ms(ms: u64) -> Self {
        if ms == 0 {
            Self::default()
        } else {
            Self::every(Duration::from_millis(ms))
        }
    }

    /// Clamps out-of-range values. Called by [`RepeatingTask::new`].
    ///
    /// A zero interval means disabled; anything shorter than
    /// [`Self::MIN_INTERVAL`] is raised to it.
    pub fn validated(mut self) -> Self {
        match self.interval {
            Some(interval) if interval.is_zero() => self.interval = None,
            Some(interval) if interval < Self::MIN_INTERVAL => {
                warn!(
                    interval_ms = interval.as_millis() as u64,
                    min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                    "repeating task interval below minimum, clamping"
                );
                self.interval = Some(Self::MIN_INTERVAL);
            }
            _ => {}
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`RepeatingTask::wait_for_tick`] for each run.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Run number, starting at 1.
    pub tick: u64,
    /// How late the task woke up relative to its due time.
    pub late_by: Duration,
    /// Whole intervals that passed without a run (0 normally).
    pub missed: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TaskMetrics {
    pub total_runs: u64,
    /// Runs that woke up more than a tenth of an interval late.
    pub total_late: u64,
    pub total_missed: u64,
    /// Longest run body reported through [`RepeatingTask::record_run_end`].
    pub max_run_time: Duration,
    pub last_run_time: Duration,
}

// ---------------------------------------------------------------------------
// RepeatingTask
// ---------------------------------------------------------------------------

/// A named, fixed-cadence timer.
pub struct RepeatingTask {
    name: &'static str,
    config: TaskConfig,
    interval: Option<Duration>,
    tick_count: u64,
    next_due: Option<TokioInstant>,
    /// Set by `wait_for_tick`, consumed by `record_run_end`.
    run_start: Option<Instant>,
    paused: bool,
    metrics: TaskMetrics,
}

impl RepeatingTask {
    /// Creates the task. The first run is due one interval (plus jitter)
    /// from now.
    pub fn new(name: &'static str, config: TaskConfig) -> Self {
        let config = config.validated();
        let interval = config.interval;

        let next_due = interval.map(|every| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max_us = config.initial_jitter.as_micros() as u64;
                Duration::from_micros(rand::rng().random_range(0..max_us.max(1)))
            };
            TokioInstant::now() + every + jitter
        });

        match interval {
            Some(every) => debug!(
                task = name,
                interval_ms = every.as_millis() as u64,
                policy = ?config.policy,
                "repeating task created"
            ),
            None => debug!(task = name, "repeating task created disabled"),
        }

        Self {
            name,
            config,
            interval,
            tick_count: 0,
            next_due,
            run_start: None,
            paused: false,
            metrics: TaskMetrics::default(),
        }
    }

    /// Creates a task running every `interval` with default settings.
    pub fn every(name: &'static str, interval: Duration) -> Self {
        Self::new(name, TaskConfig::every(interval))
    }

    /// Waits until the next run is due.
    ///
    /// Pends forever while paused or disabled. Cancel-safe: dropping the
    /// future inside `select!` loses nothing, the due time is only
    /// advanced once the sleep completes.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (due, every) = match (self.next_due, self.interval) {
            (Some(due), Some(every)) if !self.paused => (due, every),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.run_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let late = late_by > every / 10;
        let missed = (late_by.as_nanos() / every.as_nanos()) as u64;

        self.next_due = Some(match self.config.policy {
            MissedTickPolicy::Skip => now + every,
            MissedTickPolicy::Fixed => due + every,
        });

        if missed > 0 {
            warn!(
                task = self.name,
                tick = self.tick_count,
                missed,
                late_ms = late_by.as_secs_f64() * 1000.0,
                policy = ?self.config.policy,
                "repeating task fell behind"
            );
        }
        if late {
            self.metrics.total_late += 1;
        }
        self.metrics.total_missed += missed;
        self.metrics.total_runs += 1;

        trace!(task = self.name, tick = self.tick_count, late, "repeating task due");

        TickInfo {
            tick: self.tick_count,
            late_by,
            missed,
        }
    }

    /// Records that the work for the current run finished.
    ///
    /// Without a preceding `wait_for_tick` this does nothing.
    pub fn record_run_end(&mut self) {
        let Some(start) = self.run_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        self.metrics.last_run_time = elapsed;
        if elapsed > self.metrics.max_run_time {
            self.metrics.max_run_time = elapsed;
        }
        if let Some(every) = self.interval {
            if elapsed >= every {
                warn!(
                    task = self.name,
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    interval_ms = every.as_millis() as u64,
                    "repeating task run took longer than its interval"
                );
            }
        }
    }

    /// Stops runs until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(task = self.name, tick = self.tick_count, "repeating task paused");
        }
    }

    /// Resumes after a pause. The next run is due a full interval from
    /// now, so a long pause does not produce a burst of runs.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(every) = self.interval {
                self.next_due = Some(TokioInstant::now() + every);
            }
            debug!(task = self.name, tick = self.tick_count, "repeating task resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` if the task was built without an interval.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_none()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn metrics(&self) -> &TaskMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for RepeatingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("tick_count", &self.tick_count)
            .field("paused", &self.paused)
            .finish()
    }
}

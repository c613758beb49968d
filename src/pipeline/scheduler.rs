//! Periodic job scheduler.
//!
//! Runs a [`ScheduledJob`] immediately, then again every `interval` until the
//! cancellation token fires. Cycles never overlap: the wait before cycle N+1
//! starts only after cycle N has returned.
//!
//! ```text
//! Idle ──▶ Triggering ──▶ Waiting ──▶ Triggering ──▶ ...
//!              │              │
//!              └── cancel ────┴──▶ Stopped
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Work the scheduler drives. Failures are the job's own business; nothing
/// is reported back.
#[async_trait]
pub trait ScheduledJob: Send {
    async fn run_cycle(&mut self);

    /// Name used in scheduler logs
    fn job_name(&self) -> &str {
        "job"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Triggering,
    Waiting,
    Stopped,
}

/// What the scheduler did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub cycles: u64,
    pub state: SchedulerState,
}

pub struct Scheduler {
    interval: Duration,
    jitter: Duration,
    state: SchedulerState,
    cycles: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            jitter: Duration::ZERO,
            state: SchedulerState::Idle,
            cycles: 0,
        }
    }

    /// Spread each wait uniformly over `interval ± jitter`.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Drive `job` until `cancel` fires.
    pub async fn run<J: ScheduledJob + ?Sized>(
        mut self,
        job: &mut J,
        cancel: CancellationToken,
    ) -> SchedulerStats {
        info!(
            job = job.job_name(),
            interval_secs = self.interval.as_secs(),
            jitter_secs = self.jitter.as_secs(),
            "[Scheduler] Started"
        );

        loop {
            match self.state {
                SchedulerState::Idle => self.state = SchedulerState::Triggering,
                SchedulerState::Triggering => {
                    if cancel.is_cancelled() {
                        self.state = SchedulerState::Stopped;
                        continue;
                    }
                    self.cycles += 1;
                    debug!(cycle = self.cycles, job = job.job_name(), "[Scheduler] Triggering");
                    job.run_cycle().await;
                    self.state = SchedulerState::Waiting;
                }
                SchedulerState::Waiting => {
                    let wait = self.next_wait();
                    debug!(wait_ms = wait.as_millis() as u64, "[Scheduler] Waiting for next cycle");
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("[Scheduler] Received shutdown signal");
                            self.state = SchedulerState::Stopped;
                        }
                        _ = tokio::time::sleep(wait) => {
                            self.state = SchedulerState::Triggering;
                        }
                    }
                }
                SchedulerState::Stopped => {
                    info!(cycles = self.cycles, "[Scheduler] Stopped");
                    return SchedulerStats {
                        cycles: self.cycles,
                        state: self.state,
                    };
                }
            }
        }
    }

    fn next_wait(&self) -> Duration {
        jittered(self.interval, self.jitter, &mut rand::thread_rng())
    }
}

/// `interval` shifted by a uniform offset in `[-jitter, +jitter]`, never
/// below zero.
fn jittered<R: Rng + ?Sized>(interval: Duration, jitter: Duration, rng: &mut R) -> Duration {
    if jitter.is_zero() {
        return interval;
    }
    let jitter_ms = i64::try_from(jitter.as_millis()).unwrap_or(i64::MAX);
    let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
    let offset = rng.gen_range(-jitter_ms..=jitter_ms);
    let wait_ms = interval_ms.saturating_add(offset).max(0);
    Duration::from_millis(wait_ms.unsigned_abs())
}

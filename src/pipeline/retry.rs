//! Bounded retry around a fallible async operation.
//!
//! A [`RetryPolicy`] runs an operation up to `max_attempts` times with a fixed
//! delay between attempts. Only errors that report themselves as transient via
//! [`Retryable`] are retried; anything else stops the loop on the spot. The
//! delay is raced against a [`CancellationToken`] so shutdown never waits out a
//! backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Classifies an error as worth another attempt or not.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Why a retried operation gave up.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every permitted attempt failed transiently. Carries the final error.
    #[error("gave up after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    /// A non-transient error ended the loop early.
    #[error("non-retryable failure on attempt {attempt}: {error}")]
    Fatal { attempt: u32, error: E },

    /// Cancellation arrived while waiting to retry.
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32, last_error: Option<E> },
}

/// A successful result together with the number of calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("retry policy needs at least one attempt")]
pub struct ZeroAttempts;

/// Attempt budget and fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Per-invocation bookkeeping. Lives only for one `with_retry` call.
struct RetryState<E> {
    attempts_made: u32,
    attempts_remaining: u32,
    last_error: Option<E>,
}

impl<E> RetryState<E> {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts_made: 0,
            attempts_remaining: max_attempts,
            last_error: None,
        }
    }

    fn begin_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        self.attempts_made
    }
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` calls in total. Zero is rejected.
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, ZeroAttempts> {
        if max_attempts == 0 {
            return Err(ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it succeeds, fails fatally, the budget runs out,
    /// or `cancel` fires during a delay.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn with_retry<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<RetryOutcome<T>, RetryError<E>>
    where
        E: Retryable + Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut state = RetryState::new(self.max_attempts);

        loop {
            let attempt = state.begin_attempt();
            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(RetryOutcome {
                        value,
                        attempts: attempt,
                    });
                }
                Err(e) if !e.is_transient() => {
                    return Err(RetryError::Fatal { attempt, error: e });
                }
                Err(e) => e,
            };

            if state.attempts_remaining == 0 {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = self.delay.as_millis() as u64,
                error = %error,
                "[Retry] Transient failure, retrying"
            );
            state.last_error = Some(error);

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled {
                        attempts: state.attempts_made,
                        last_error: state.last_error.take(),
                    });
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
    }
}

//! Bounded retry and polling
//!
//! All waiting in the driver is expressed as a fixed number of attempts
//! separated by a fixed delay. The same primitive drives register write
//! verification, transport fault retries and the initializer's status
//! polling loops.

use crate::transport::Delay;

/// Default number of attempts for a single register transaction
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default delay between attempts, in milliseconds
pub const DEFAULT_BACKOFF_MS: u32 = 50;

/// Result of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<T, E> {
    /// Operation finished
    Done(T),
    /// Operation failed but may succeed if tried again
    Retry(E),
    /// Operation failed and must not be retried
    Fail(E),
}

impl<T, E> From<Result<T, E>> for Attempt<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(e) => Self::Retry(e),
        }
    }
}

/// Fixed attempt budget with a fixed inter-attempt delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (at least one attempt is always made)
    pub attempts: u32,
    /// Delay between attempts in milliseconds
    pub backoff_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BACKOFF_MS)
    }
}

impl RetryPolicy {
    /// Create a policy with the given budget
    pub const fn new(attempts: u32, backoff_ms: u32) -> Self {
        Self {
            attempts,
            backoff_ms,
        }
    }

    /// Run `op` until it completes, fails hard, or the budget runs out
    ///
    /// `op` receives the context and the 1-based attempt number. The
    /// delay is only taken between attempts, never after the last one.
    /// When the budget is exhausted the error of the final attempt is
    /// returned.
    pub fn run<C, T, E, F>(&self, ctx: &mut C, mut op: F) -> Result<T, E>
    where
        C: Delay + ?Sized,
        F: FnMut(&mut C, u32) -> Attempt<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(ctx, attempt) {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) if attempt >= attempts => return Err(e),
                Attempt::Retry(_) => {
                    ctx.delay_ms(self.backoff_ms);
                    attempt += 1;
                }
            }
        }
    }
}

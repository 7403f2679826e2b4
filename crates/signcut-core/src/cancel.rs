//! Cooperative cancellation for long running geometry passes.
//!
//! Packing, hierarchy reconstruction and the EcoCut merge call
//! [`Budget::checkpoint`] between units of work. A budget trips when its
//! step allowance runs out, its deadline passes, or its [`CancelToken`] is
//! triggered from another thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Shareable flag used to request cancellation from outside the worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Step and time allowance for one pipeline invocation
#[derive(Debug, Default)]
pub struct Budget {
    token: CancelToken,
    max_steps: Option<u64>,
    deadline: Option<Instant>,
    steps: AtomicU64,
}

impl Budget {
    /// A budget that never trips on its own.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    /// Count one unit of work and fail if the budget is exhausted.
    pub fn checkpoint(&self) -> Result<()> {
        let taken = self.steps.fetch_add(1, Ordering::Relaxed) + 1;

        if self.token.is_cancelled() {
            return Err(Error::Cancelled {
                reason: "cancellation requested".to_string(),
            });
        }
        if let Some(max) = self.max_steps {
            if taken > max {
                return Err(Error::Cancelled {
                    reason: format!("step budget of {} exhausted", max),
                });
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Cancelled {
                    reason: "timeout elapsed".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget() {
        let budget = Budget::unlimited();
        for _ in 0..1000 {
            assert!(budget.checkpoint().is_ok());
        }
        assert_eq!(budget.steps_taken(), 1000);
    }

    #[test]
    fn test_step_budget_trips() {
        let budget = Budget::unlimited().with_max_steps(3);
        assert!(budget.checkpoint().is_ok());
        assert!(budget.checkpoint().is_ok());
        assert!(budget.checkpoint().is_ok());
        let err = budget.checkpoint().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_token_cancels() {
        let token = CancelToken::new();
        let budget = Budget::unlimited().with_token(token.clone());
        assert!(budget.checkpoint().is_ok());
        token.cancel();
        assert!(budget.checkpoint().is_err());
    }

    #[test]
    fn test_zero_timeout_trips() {
        let budget = Budget::unlimited().with_timeout(Duration::from_millis(0));
        assert!(budget.checkpoint().is_err());
    }
}

//! Guards for materialization points
//!
//! Every reduction (histogram or pixel count) checks a [`ReductionBudget`]
//! before touching any pixel and polls a [`CancelToken`] while it runs.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default maximum number of pixels a single reduction may visit
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Upper bound on the number of pixels visited by one reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionBudget {
    pub max_pixels: u64,
}

impl ReductionBudget {
    /// Create a budget allowing at most `max_pixels` pixels per reduction
    pub fn new(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    /// Fail with [`Error::ResourceBudgetExceeded`] if `requested` is over budget.
    pub fn check(&self, requested: u64) -> Result<()> {
        if requested > self.max_pixels {
            log::warn!(
                "reduction of {} pixels rejected (budget {})",
                requested,
                self.max_pixels
            );
            return Err(Error::ResourceBudgetExceeded {
                requested,
                max: self.max_pixels,
            });
        }
        Ok(())
    }
}

impl Default for ReductionBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS)
    }
}

/// Cooperative cancellation flag with an optional deadline
///
/// Clones share the same flag, so a token handed to a running pipeline can be
/// cancelled from another thread.
///
/// ```
/// use edgeotsu_core::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
/// handle.cancel();
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token that never fires until [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also fires once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Fail with [`Error::Cancelled`] or [`Error::TimedOut`] if the token fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::TimedOut);
        }
        Ok(())
    }
}

/// Budget and cancellation shared by all reductions of one invocation
#[derive(Debug, Clone, Default)]
pub struct ReductionContext {
    pub budget: ReductionBudget,
    pub cancel: CancelToken,
}

impl ReductionContext {
    pub fn new(budget: ReductionBudget, cancel: CancelToken) -> Self {
        Self { budget, cancel }
    }

    /// Run both checks for a reduction about to visit `requested` pixels.
    pub fn checkpoint(&self, requested: u64) -> Result<()> {
        self.cancel.check()?;
        self.budget.check(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget() {
        let budget = ReductionBudget::new(100);
        assert!(budget.check(100).is_ok());
        assert!(matches!(
            budget.check(101),
            Err(Error::ResourceBudgetExceeded {
                requested: 101,
                max: 100
            })
        ));
    }

    #[test]
    fn test_zero_timeout_fires() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        assert!(matches!(token.check(), Err(Error::TimedOut)));
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let token = CancelToken::with_timeout(Duration::from_secs(3600));
        assert!(token.check().is_ok());
        token.cancel();
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_checkpoint_order() {
        let ctx = ReductionContext::new(ReductionBudget::new(1), CancelToken::new());
        ctx.cancel.cancel();
        assert!(matches!(ctx.checkpoint(10), Err(Error::Cancelled)));
    }
}

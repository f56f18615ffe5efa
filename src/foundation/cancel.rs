use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Request-scoped cancellation flag with an optional deadline.
///
/// Clones share the same flag, so a caller can keep one clone and cancel a synthesis running on
/// another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Clone sharing this token's flag whose deadline is at most `timeout` from now.
    pub fn limited_to(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return [`KenBurnsError::Cancelled`] once cancelled or past the deadline.
    pub fn check(&self) -> KenBurnsResult<()> {
        if self.flag.load(Ordering::Relaxed) {
            return Err(KenBurnsError::cancelled("request cancelled"));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(KenBurnsError::cancelled("request deadline exceeded"));
        }
        Ok(())
    }
}

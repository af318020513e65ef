use crate::error::{SeatingError, SeatingResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative stop signal for a generation run.
///
/// Clones share the same flag, so one handle can be given to the engine and
/// another kept by whoever may want to stop it. An optional deadline turns the
/// token into a time limit without a watcher thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if the token has one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub(crate) fn check(&self, placed: usize, total: usize) -> SeatingResult<()> {
        if self.is_cancelled() {
            Err(SeatingError::Cancelled { placed, total })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_continues_until_cancelled() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(token.check(0, 10).is_ok());

        handle.cancel();
        assert_eq!(
            token.check(3, 10),
            Err(SeatingError::Cancelled { placed: 3, total: 10 })
        );
    }

    #[test]
    fn test_zero_timeout_is_already_expired() {
        let token = CancellationToken::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_long_timeout_is_not_expired() {
        let token = CancellationToken::with_timeout(Duration::from_secs(3600));
        assert!(!token.is_cancelled());
        let left = token.remaining().unwrap();
        assert!(left > Duration::from_secs(3500) && left <= Duration::from_secs(3600));
    }

    #[test]
    fn test_remaining_time() {
        assert_eq!(CancellationToken::new().remaining(), None);
        let expired = CancellationToken::with_timeout(Duration::ZERO);
        assert_eq!(expired.remaining(), Some(Duration::ZERO));
    }
}

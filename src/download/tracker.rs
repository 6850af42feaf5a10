//! Outstanding-work accounting for one batch.

use std::sync::Arc;

use tokio::sync::watch;

/// Counts admitted-but-unfinished jobs and lets a caller wait for zero.
#[derive(Debug, Clone)]
pub struct WorkTracker {
    outstanding: Arc<watch::Sender<usize>>,
}

impl Default for WorkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkTracker {
    /// Creates a tracker with no outstanding work.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            outstanding: Arc::new(sender),
        }
    }

    /// Admits one unit of work. The unit is released when the returned guard
    /// is dropped, so it can be released at most once.
    #[must_use = "dropping the unit immediately releases it"]
    pub fn admit(&self) -> WorkUnit {
        self.outstanding.send_modify(|count| *count += 1);
        WorkUnit {
            tracker: self.clone(),
        }
    }

    /// Returns the number of units not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolves once every admitted unit has been released.
    pub async fn wait_idle(&self) {
        let mut receiver = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver.wait_for(|count| *count == 0).await;
    }

    fn release(&self) {
        self.outstanding
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// One admitted unit of work. Travels with its job through retries and is
/// released exactly once, when the job reaches a terminal state and is dropped.
#[derive(Debug)]
pub struct WorkUnit {
    tracker: WorkTracker,
}

impl Drop for WorkUnit {
    fn drop(&mut self) {
        self.tracker.release();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_without_work() {
        let tracker = WorkTracker::new();
        tokio::time::timeout(Duration::from_secs(1), tracker.wait_idle())
            .await
            .expect("idle tracker must not block");
    }

    #[test]
    fn test_units_release_once_on_drop() {
        let tracker = WorkTracker::new();
        let first = tracker.admit();
        let second = tracker.admit();
        assert_eq!(tracker.outstanding(), 2);

        drop(first);
        assert_eq!(tracker.outstanding(), 1);
        drop(second);
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_last_unit_released() {
        let tracker = WorkTracker::new();
        let unit = tracker.admit();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(unit);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must finish")
            .expect("waiter task must not panic");
    }
}

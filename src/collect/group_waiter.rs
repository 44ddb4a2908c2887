//! Fan-out/fan-in coordination for per-entity collection tasks.

use futures_util::future::join_all;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "collect";

/// Runs a group of independent tasks concurrently and waits for all of them.
///
/// [`spawn`](Self::spawn) schedules one unit of work to run concurrently with
/// everything previously scheduled in the same group; [`wait`](Self::wait)
/// blocks until every task has run to completion, success or failure. Tasks
/// communicate results by mutating state shared with the caller (the
/// collection session) rather than returning values, and a panic inside one
/// task never prevents its siblings, or `wait`, from completing.
///
/// There is no ordering between tasks and no concurrency cap: every scheduled
/// task runs immediately. Unbounded fan-out assumes the entity count is small
/// (organizations per credential); inventorying a high-cardinality entity
/// kind through this type needs an explicit cap first.
#[derive(Debug, Default)]
pub struct GroupWaiter {
    handles: Vec<JoinHandle<()>>,
}

impl GroupWaiter {
    /// Create an empty group.
    #[must_use]
    pub const fn new() -> Self {
        Self { handles: Vec::new() }
    }

    /// Schedule one unit of work to run concurrently with the group.
    pub fn spawn(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.handles.push(tokio::spawn(task));
    }

    /// Wait until every scheduled task has finished.
    ///
    /// A crashed task is equivalent to a task that failed its own internal
    /// error handling before mutating shared state: it is logged here and
    /// otherwise ignored.
    pub async fn wait(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result
                && e.is_panic()
            {
                log::error!(target: LOG_TARGET, "collection task panicked: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use core::time::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn waits_for_all_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut gw = GroupWaiter::new();

        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            gw.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let _ = counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        gw.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn empty_group_returns_immediately() {
        GroupWaiter::new().wait().await;
    }

    #[tokio::test]
    async fn panicked_task_does_not_block_siblings() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut gw = GroupWaiter::new();

        gw.spawn(async {
            panic!("task failure");
        });
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            gw.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let _ = counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        gw.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn tasks_run_concurrently() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let mut gw = GroupWaiter::new();

        for _ in 0..8 {
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            gw.spawn(async move {
                let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = max_seen.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _ = active.fetch_sub(1, Ordering::SeqCst);
            });
        }

        gw.wait().await;
        assert!(max_seen.load(Ordering::SeqCst) > 1);
    }
}

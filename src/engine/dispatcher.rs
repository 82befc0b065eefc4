// * Bounded Worker Pool
// * Runs one task per input with at most `size` in flight and joins them all.
// * Results come back in submission order regardless of completion order.

use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    // * A zero size would never make progress, so it is clamped to one worker
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `task` over every input and waits for all of them.
    pub async fn run<I, F, Fut>(&self, inputs: Vec<I>, task: F) -> Vec<Fut::Output>
    where
        F: FnMut(I) -> Fut,
        Fut: Future,
    {
        debug!(tasks = inputs.len(), workers = self.size, "Dispatching batch");

        stream::iter(inputs).map(task).buffered(self.size).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_submission_order() {
        let pool = WorkerPool::new(3);
        // * Earlier tasks sleep longer so they finish last
        let results = pool
            .run(vec![5u64, 4, 3, 2, 1], |n| async move {
                tokio::time::sleep(Duration::from_millis(n * 5)).await;
                n * 10
            })
            .await;

        assert_eq!(results, vec![50, 40, 30, 20, 10]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        pool.run((0..8).collect::<Vec<_>>(), |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_size_still_runs() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);

        let results = pool.run(vec![1, 2], |n| async move { n + 1 }).await;
        assert_eq!(results, vec![2, 3]);

        let empty: Vec<i32> = pool.run(Vec::<i32>::new(), |n| async move { n }).await;
        assert!(empty.is_empty());
    }
}

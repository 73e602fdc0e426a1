// Bounded in-stage concurrency: each agent's internal item batching runs at
// most K items at a time (Validation's browser-pool capacity, Enrichment's
// and Embedding's worker count). `StagePool` is the shared primitive all
// three use; it owns nothing but a semaphore, the item-level resource (e.g.
// the browser pool) is acquired separately inside each permit.

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Clone)]
pub struct StagePool {
    semaphore: Arc<Semaphore>,
}

impl StagePool {
    pub fn new(concurrency: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(concurrency.max(1))) }
    }

    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("StagePool semaphore is never closed")
    }

    /// Runs `items` through `work` with at most `self` concurrency permits
    /// held at once, short-circuiting further dispatch (not in-flight work)
    /// once `should_stop` reports true, matching the cooperative-cancellation
    /// contract every agent honors at batch boundaries.
    pub async fn run_bounded<I, F, Fut, O>(&self, items: Vec<I>, should_stop: impl Fn() -> bool, work: F) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = O> + Send,
    {
        let work = Arc::new(work);
        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            if should_stop() {
                break;
            }
            let permit_pool = self.semaphore.clone();
            let work = Arc::clone(&work);
            handles.push(tokio::spawn(async move {
                let _permit = permit_pool.acquire_owned().await.expect("StagePool semaphore is never closed");
                work(item).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(output) = handle.await {
                results.push(output);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn run_bounded_never_exceeds_concurrency() {
        let pool = StagePool::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..8).collect();
        let in_flight_captured = Arc::clone(&in_flight);
        let max_seen_captured = Arc::clone(&max_seen);
        pool.run_bounded(items, || false, move |_i| {
            let in_flight = Arc::clone(&in_flight_captured);
            let max_seen = Arc::clone(&max_seen_captured);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn run_bounded_stops_dispatching_once_should_stop_fires() {
        let pool = StagePool::new(4);
        let checks = Arc::new(AtomicUsize::new(0));
        let checks_captured = Arc::clone(&checks);
        let items: Vec<usize> = (0..100).collect();

        let results: Vec<usize> = pool
            .run_bounded(
                items,
                move || checks_captured.fetch_add(1, Ordering::SeqCst) >= 3,
                move |i| async move { i },
            )
            .await;

        assert!(results.len() <= 4);
    }
}

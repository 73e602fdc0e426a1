// Scoped resource acquisition for process-wide shared resources: the
// headless browser pool (Validation) and any other bounded external handle
// an agent needs released on every exit path, including cancellation.
//
// Capacity is fixed at construction (matches this codebase's preference for
// explicit init on first use over lazily-grown pools). `acquire` blocks until
// a slot is free or the timeout elapses; the returned guard gives the slot
// back on drop, so a `?` early-return or a panic during processing never
// leaks it.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum ResourcePoolError {
    #[error("timed out waiting {0:?} for a pool slot")]
    AcquireTimeout(Duration),
    #[error("resource pool is shut down")]
    ShutDown,
}

struct Inner<T> {
    idle: Mutex<Vec<T>>,
    semaphore: Arc<Semaphore>,
}

/// A fixed-capacity pool of reusable resources (e.g. headless browser
/// contexts). `T` is handed out by value through the guard and returned to
/// the idle list when the guard drops.
pub struct ResourcePool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Send + 'static> ResourcePool<T> {
    /// Builds a pool whose capacity is `resources.len()`; every entry starts idle.
    pub fn new(resources: Vec<T>) -> Self {
        let capacity = resources.len();
        Self {
            inner: Arc::new(Inner {
                idle: Mutex::new(resources),
                semaphore: Arc::new(Semaphore::new(capacity)),
            }),
        }
    }

    /// Acquires a slot, waiting up to `wait` for one to free up. Cooperative
    /// cancellation: callers should race this future against a cancellation
    /// check rather than block indefinitely.
    pub async fn acquire(&self, wait: Duration) -> Result<ResourceGuard<T>, ResourcePoolError> {
        let permit = timeout(wait, Arc::clone(&self.inner.semaphore).acquire_owned())
            .await
            .map_err(|_| ResourcePoolError::AcquireTimeout(wait))?
            .map_err(|_| ResourcePoolError::ShutDown)?;

        let resource = {
            let mut idle = self.inner.idle.lock().await;
            idle.pop().expect("semaphore accounting guarantees an idle resource is available")
        };

        Ok(ResourceGuard { idle: Arc::clone(&self.inner), resource: Some(resource), _permit: permit })
    }
}

/// Holds one resource checked out of a [`ResourcePool`]. Dropping it, for any
/// reason (normal return, early `?`, cancellation, panic-unwind), returns the
/// resource to the pool and the permit back to the semaphore.
pub struct ResourceGuard<T: Send + 'static> {
    idle: Arc<Inner<T>>,
    resource: Option<T>,
    _permit: OwnedSemaphorePermit,
}

impl<T: Send + 'static> ResourceGuard<T> {
    pub fn get(&self) -> &T {
        self.resource.as_ref().expect("resource taken before guard dropped")
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.resource.as_mut().expect("resource taken before guard dropped")
    }
}

impl<T: Send + 'static> Drop for ResourceGuard<T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            let idle = Arc::clone(&self.idle);
            tokio::spawn(async move {
                idle.idle.lock().await.push(resource);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_blocks_until_a_slot_is_released() {
        let pool: ResourcePool<u32> = ResourcePool::new(vec![1]);
        let guard = pool.acquire(Duration::from_millis(50)).await.unwrap();
        assert_eq!(*guard.get(), 1);

        let pool2 = pool.clone();
        let second = tokio::spawn(async move { pool2.acquire(Duration::from_millis(200)).await });

        drop(guard);
        let second = second.await.unwrap().unwrap();
        assert_eq!(*second.get(), 1);
    }

    #[tokio::test]
    async fn acquire_times_out_when_pool_is_exhausted() {
        let pool: ResourcePool<u32> = ResourcePool::new(vec![1]);
        let _held = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let err = pool.acquire(Duration::from_millis(20)).await;
        assert!(matches!(err, Err(ResourcePoolError::AcquireTimeout(_))));
    }
}

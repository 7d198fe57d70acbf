//! Lazy, invalidatable collection cache.
//!
//! Each parent entity owns one [`Collection`] per child listing. The first
//! read fetches and memoizes; later reads return the stored snapshot without
//! I/O; [`Collection::invalidate`] forces the next read to re-fetch.
//!
//! The mutex is held across the loading future, so concurrent first reads on
//! the same collection resolve to exactly one fetch. It is released before the
//! snapshot is returned: readers never block on consumers of
//! previously-returned snapshots, which stay valid after invalidation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ClientResult;

/// A lazily-loaded, invalidatable sequence of child entities.
pub struct Collection<T> {
    slot: Mutex<Option<Arc<Vec<T>>>>,
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached snapshot, loading it via `load` on first use.
    ///
    /// A failed load leaves the collection unloaded, so the next read
    /// retries. Snapshots are immutable; every read of a loaded collection
    /// returns the same `Arc` until invalidation.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> ClientResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<Vec<T>>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(items) = slot.as_ref() {
            return Ok(Arc::clone(items));
        }
        let items = Arc::new(load().await?);
        *slot = Some(Arc::clone(&items));
        Ok(items)
    }

    /// Discard the cached snapshot; the next read re-fetches.
    ///
    /// Does not cancel an in-flight load and does not touch snapshots already
    /// handed out.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// Whether a snapshot is currently cached.
    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot.try_lock() {
            Ok(slot) => f
                .debug_struct("Collection")
                .field("loaded", &slot.is_some())
                .finish(),
            Err(_) => f.write_str("Collection(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ClientError;

    #[tokio::test]
    async fn second_read_is_served_from_memory() {
        let collection = Collection::new();
        let fetches = AtomicUsize::new(0);
        let fetches = &fetches;

        let load = || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["a".to_string(), "b".to_string()])
        };

        let first = collection.get_or_load(load).await.unwrap();
        let second = collection
            .get_or_load(|| async { unreachable!("must not refetch") })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let collection = Collection::new();
        let fetches = AtomicUsize::new(0);
        let fetches = &fetches;

        let load = || async move { Ok(vec![fetches.fetch_add(1, Ordering::SeqCst)]) };

        let first = collection.get_or_load(load).await.unwrap();
        assert_eq!(*first, vec![0]);

        collection.invalidate().await;
        assert!(!collection.is_loaded().await);

        let second = collection.get_or_load(load).await.unwrap();
        assert_eq!(*second, vec![1]);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        // The old snapshot survives invalidation untouched.
        assert_eq!(*first, vec![0]);
    }

    #[tokio::test]
    async fn concurrent_first_reads_fetch_once() {
        let collection = Arc::new(Collection::new());
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let collection = Arc::clone(&collection);
            let fetches = Arc::clone(&fetches);
            tasks.push(tokio::spawn(async move {
                collection
                    .get_or_load(|| async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(vec![42u32])
                    })
                    .await
                    .unwrap()
            }));
        }

        for task in tasks {
            assert_eq!(*task.await.unwrap(), vec![42]);
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let collection: Collection<u32> = Collection::new();

        let err = collection
            .get_or_load(|| async {
                Err(ClientError::Network {
                    message: "connection reset".into(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
        assert!(!collection.is_loaded().await);

        let items = collection.get_or_load(|| async { Ok(vec![1]) }).await.unwrap();
        assert_eq!(*items, vec![1]);
    }
}

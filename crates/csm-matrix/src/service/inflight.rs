//! In-flight de-duplication
//!
//! Concurrent requests for the same key share one future. The entry is
//! dropped once the shared future completes, so a later request starts a
//! fresh fetch.

use std::collections::HashMap;
use std::hash::Hash;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

pub struct InFlight<K, V> {
    entries: Mutex<HashMap<K, Shared<BoxFuture<'static, V>>>>,
}

impl<K, V> Default for InFlight<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently running.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the running fetch for `key`, or start one with `start`.
    pub async fn run<F>(&self, key: K, start: F) -> V
    where
        F: FnOnce() -> BoxFuture<'static, V>,
    {
        let shared = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(running) => {
                    tracing::trace!("[csm-matrix] joining in-flight fetch");
                    running.clone()
                }
                None => {
                    let fresh = start().shared();
                    entries.insert(key.clone(), fresh.clone());
                    fresh
                }
            }
        };

        let out = shared.clone().await;

        let mut entries = self.entries.lock();
        if entries.get(&key).is_some_and(|f| f.ptr_eq(&shared)) {
            entries.remove(&key);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_fetch() {
        let inflight = InFlight::<u32, u32>::new();
        let starts = Arc::new(AtomicUsize::new(0));

        let call = |value: u32| {
            let starts = Arc::clone(&starts);
            inflight.run(1, move || {
                async move {
                    starts.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    value
                }
                .boxed()
            })
        };

        let (a, b, c) = tokio::join!(call(10), call(20), call(30));
        assert_eq!((a, b, c), (10, 10, 10));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(inflight.is_empty());
    }

    #[tokio::test]
    async fn test_finished_fetch_is_not_reused() {
        let inflight = InFlight::<u32, u32>::new();
        assert_eq!(inflight.run(1, || async { 1 }.boxed()).await, 1);
        assert_eq!(inflight.run(1, || async { 2 }.boxed()).await, 2);
    }
}

//! Per-key async mutexes.
//!
//! Serializes check-then-act sequences (vote toggles, dedup-then-insert)
//! that span multiple store calls on the same logical key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily-allocated mutexes, one per key.
///
/// Holding the returned guard excludes every other `acquire` of the same
/// key; different keys never contend. Entries are kept for the lifetime of
/// the map.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.acquire((1, 2)).await;

        let second = timeout(Duration::from_millis(50), locks.acquire((1, 2))).await;
        assert!(second.is_err());

        drop(guard);
        let second = timeout(Duration::from_millis(50), locks.acquire((1, 2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _guard = locks.acquire((1, 2)).await;

        let other = timeout(Duration::from_millis(50), locks.acquire((1, 3))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn guard_serializes_across_tasks() {
        let locks = Arc::new(KeyedLocks::new());
        let shared = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let locks = locks.clone();
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("key").await;
                shared.lock().unwrap().push(("start", i));
                tokio::task::yield_now().await;
                shared.lock().unwrap().push(("end", i));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every start is immediately followed by the matching end: no
        // interleaving happened inside the critical section.
        let events = shared.lock().unwrap();
        for pair in events.chunks(2) {
            assert_eq!(pair[0].0, "start");
            assert_eq!(pair[1].0, "end");
            assert_eq!(pair[0].1, pair[1].1);
        }
    }
}

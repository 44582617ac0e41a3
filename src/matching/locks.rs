use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-pair async locks so that operations touching the same two users run
/// one at a time. The pair is unordered: `(a, b)` and `(b, a)` share a lock.
#[derive(Clone, Default)]
pub struct PairLocks {
    // ordered pair -> lock
    locks: Arc<Mutex<HashMap<(String, String), Arc<Mutex<()>>>>>,
}

fn ordered(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, a: &str, b: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(ordered(a, b)).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops entries nobody is holding or waiting on.
    pub async fn cleanup(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pair_is_unordered() {
        let locks = PairLocks::new();
        let guard = locks.acquire("alice", "bob").await;

        let other = locks.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(50), async move {
            other.acquire("bob", "alice").await;
        })
        .await;
        assert!(blocked.is_err(), "reversed pair must wait on the same lock");

        drop(guard);
        let _again = locks.acquire("bob", "alice").await;
    }

    #[tokio::test]
    async fn test_distinct_pairs_do_not_block() {
        let locks = PairLocks::new();
        let _ab = locks.acquire("alice", "bob").await;
        let cd = tokio::time::timeout(Duration::from_millis(50), locks.acquire("carol", "dave")).await;
        assert!(cd.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_held_locks() {
        let locks = PairLocks::new();
        let held = locks.acquire("alice", "bob").await;
        drop(locks.acquire("carol", "dave").await);

        locks.cleanup().await;
        assert_eq!(locks.len().await, 1);

        drop(held);
        locks.cleanup().await;
        assert_eq!(locks.len().await, 0);
    }
}

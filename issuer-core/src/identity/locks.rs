use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rst_common::with_tokio::tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// `IdentityLocks` is the single writer lock per identity
///
/// Tree mutations and state publishing of the same DID are serialized through
/// it, operations on different DIDs never wait on each other. Clones share the
/// same set of locks. The same lock set also serializes link sessions, keyed
/// by session id.
#[derive(Clone, Default)]
pub struct IdentityLocks {
    locks: LockMap,
}

/// `IdentityGuard` holds a key's lock, an entry nobody waits on anymore is
/// dropped from the lock set on release
pub struct IdentityGuard {
    key: String,
    locks: LockMap,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let idle = locks
            .get(&self.key)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);

        if idle {
            locks.remove(&self.key);
        }
    }
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `acquire` waits for the key's lock, it is released when the guard is dropped
    pub async fn acquire(&self, key: &str) -> IdentityGuard {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            locks.entry(key.to_string()).or_default().clone()
        };

        IdentityGuard {
            key: key.to_string(),
            locks: self.locks.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn held(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

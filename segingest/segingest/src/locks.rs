//! Process-local advisory locks keyed by segment.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

/// Keeps two workers from importing the same segment at once.
#[derive(Debug, Default)]
pub struct SegmentLocks {
    held: Mutex<HashSet<String>>,
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct SegmentLockGuard<'l> {
    locks: &'l SegmentLocks,
    key: String,
}

impl SegmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(route_id: &str, segment_index: u32) -> String {
        format!("{route_id}/{segment_index}")
    }

    /// Take the lock for `key`, or `None` if another worker holds it.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<SegmentLockGuard<'_>> {
        let key = key.into();
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(key.clone()) {
            return None;
        }
        Some(SegmentLockGuard { locks: self, key })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

impl Drop for SegmentLockGuard<'_> {
    fn drop(&mut self) {
        self.locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_waits_for_release() {
        let locks = SegmentLocks::new();
        let key = SegmentLocks::key("dongle--0000002f", 3);
        assert_eq!(key, "dongle--0000002f/3");
        let guard = locks.try_acquire(key.as_str()).unwrap();
        assert!(locks.try_acquire(key.as_str()).is_none());
        assert!(locks.try_acquire("dongle--0000002f/4").is_some());
        drop(guard);
        assert!(!locks.is_held(&key));
        assert!(locks.try_acquire(key).is_some());
    }
}

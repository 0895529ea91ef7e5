//! Children cache shared by every open view of the catalog.
//!
//! Each parent id carries an epoch; invalidating a parent (or the whole
//! cache) bumps the epoch and drops the cached list. Views remember the
//! stamp they fetched under and re-fetch once it no longer matches.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::domain::{ProcessId, ProcessNode};

/// Epoch pair a fetch was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStamp {
    key: u64,
    global: u64,
}

#[derive(Debug, Default)]
struct CacheEntry {
    epoch: u64,
    children: Option<Vec<ProcessNode>>,
}

#[derive(Debug, Default)]
pub struct ChildrenCache {
    entries: RefCell<HashMap<ProcessId, CacheEntry>>,
    global_epoch: Cell<u64>,
}

impl ChildrenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn stamp(&self, parent: &ProcessId) -> CacheStamp {
        let key = self
            .entries
            .borrow()
            .get(parent)
            .map(|e| e.epoch)
            .unwrap_or(0);
        CacheStamp {
            key,
            global: self.global_epoch.get(),
        }
    }

    /// True if `seen` predates an invalidation of `parent`.
    pub fn is_stale(&self, parent: &ProcessId, seen: CacheStamp) -> bool {
        self.stamp(parent) != seen
    }

    /// Store the latest fetched children of `parent`.
    pub fn record(&self, parent: &ProcessId, children: &[ProcessNode]) {
        self.entries
            .borrow_mut()
            .entry(parent.clone())
            .or_default()
            .children = Some(children.to_vec());
    }

    pub fn cached(&self, parent: &ProcessId) -> Option<Vec<ProcessNode>> {
        self.entries
            .borrow()
            .get(parent)
            .and_then(|e| e.children.clone())
    }

    pub fn invalidate(&self, parent: &ProcessId) {
        debug!("invalidate children of {}", parent);
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(parent.clone()).or_default();
        entry.epoch += 1;
        entry.children = None;
    }

    pub fn invalidate_all(&self) {
        debug!("invalidate all children");
        self.global_epoch.set(self.global_epoch.get() + 1);
        for entry in self.entries.borrow_mut().values_mut() {
            entry.children = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ProcessId {
        ProcessId::new(id)
    }

    #[test]
    fn given_recorded_children_when_reading_then_returns_them() {
        let cache = ChildrenCache::new();
        cache.record(&pid("p"), &[ProcessNode::new("a", "A")]);

        let cached = cache.cached(&pid("p")).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, pid("a"));
    }

    #[test]
    fn given_invalidated_parent_when_checking_stamp_then_stale_and_dropped() {
        let cache = ChildrenCache::new();
        cache.record(&pid("p"), &[ProcessNode::new("a", "A")]);
        let seen = cache.stamp(&pid("p"));

        cache.invalidate(&pid("p"));

        assert!(cache.is_stale(&pid("p"), seen));
        assert!(cache.cached(&pid("p")).is_none());
    }

    #[test]
    fn given_other_parent_invalidated_when_checking_then_not_stale() {
        let cache = ChildrenCache::new();
        let seen = cache.stamp(&pid("p"));

        cache.invalidate(&pid("q"));

        assert!(!cache.is_stale(&pid("p"), seen));
    }

    #[test]
    fn given_global_invalidation_when_checking_any_parent_then_stale() {
        let cache = ChildrenCache::new();
        cache.record(&pid("q"), &[]);
        let seen_p = cache.stamp(&pid("p"));
        let seen_q = cache.stamp(&pid("q"));

        cache.invalidate_all();

        assert!(cache.is_stale(&pid("p"), seen_p));
        assert!(cache.is_stale(&pid("q"), seen_q));
        assert!(cache.cached(&pid("q")).is_none());
    }
}

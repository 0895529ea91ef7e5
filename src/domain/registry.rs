//! Expansion registry: the set of process ids whose children are visible.
//!
//! One registry is owned by the page/view composing a tree and handed to
//! the tree (and to any other flow that must open a node) as an
//! `Rc<dyn ExpansionRegistry>`. Standalone trees get an isolated instance.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::trace;

use crate::domain::ProcessId;

/// Shared handle to an expansion registry.
pub type SharedRegistry = Rc<dyn ExpansionRegistry>;

/// Expansion state capability injected into every tree.
pub trait ExpansionRegistry {
    fn is_expanded(&self, id: &ProcessId) -> bool;

    /// Adds `id`; no-op if already present.
    fn expand(&self, id: &ProcessId);

    /// Removes `id`; no-op if absent.
    fn collapse(&self, id: &ProcessId);

    /// Snapshot of all expanded ids, sorted.
    fn expanded(&self) -> Vec<ProcessId>;

    fn clear(&self);

    /// Flips membership and returns the new state.
    fn toggle(&self, id: &ProcessId) -> bool {
        if self.is_expanded(id) {
            self.collapse(id);
            false
        } else {
            self.expand(id);
            true
        }
    }
}

/// In-memory registry backed by an ordered set.
#[derive(Debug, Default)]
pub struct ExpansionSet {
    ids: RefCell<BTreeSet<ProcessId>>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// New registry ready to be shared between views.
    pub fn shared() -> SharedRegistry {
        Rc::new(Self::new())
    }

    /// Registry private to a single tree (standalone usage, tests).
    pub fn isolated() -> SharedRegistry {
        Self::shared()
    }

    pub fn len(&self) -> usize {
        self.ids.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}

impl ExpansionRegistry for ExpansionSet {
    fn is_expanded(&self, id: &ProcessId) -> bool {
        self.ids.borrow().contains(id)
    }

    fn expand(&self, id: &ProcessId) {
        if self.ids.borrow_mut().insert(id.clone()) {
            trace!("expand: {}", id);
        }
    }

    fn collapse(&self, id: &ProcessId) {
        if self.ids.borrow_mut().remove(id) {
            trace!("collapse: {}", id);
        }
    }

    fn expanded(&self) -> Vec<ProcessId> {
        self.ids.borrow().iter().cloned().collect()
    }

    fn clear(&self) {
        self.ids.borrow_mut().clear();
    }
}

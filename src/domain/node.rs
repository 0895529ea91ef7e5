//! Per-node state of the hierarchy: child cache, in-flight fetch and
//! the single-slot pending reorder buffer.

use generational_arena::Index;

use crate::domain::{CacheStamp, ProcessId, ProcessNode};

/// Handle of a node instance inside a tree. Handles of destroyed
/// instances never resolve again, even if the slot is reused.
pub type NodeId = Index;

/// Identifies one issued children fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(pub(crate) u64);

/// One mounted process in the tree.
#[derive(Debug)]
pub struct HierarchyNode {
    pub process: ProcessNode,
    /// Nesting depth, indentation only
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Child cache in display order; `None` while nothing is loaded
    pub(crate) children: Option<Vec<NodeId>>,
    /// Most recent fetch issued for this node
    pub(crate) in_flight: Option<FetchTicket>,
    /// Cache stamp of the most recent fetch or commit
    pub(crate) seen: Option<CacheStamp>,
    /// Expansion state observed at the last sync
    pub(crate) was_expanded: bool,
    /// Last fetch or commit returned children; kept across collapse
    pub(crate) known_children: bool,
    pub(crate) pending_reorder: Option<Vec<ProcessId>>,
    pub(crate) dragging: Option<ProcessId>,
}

impl HierarchyNode {
    pub fn new(process: ProcessNode, depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            process,
            depth,
            parent,
            children: None,
            in_flight: None,
            seen: None,
            was_expanded: false,
            known_children: false,
            pending_reorder: None,
            dragging: None,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.process.id
    }

    /// Child handles in display order, empty if nothing is loaded.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn children_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Known children: eager hint or a non-empty list from a prior fetch,
    /// even if the node was collapsed since.
    pub fn has_known_children(&self) -> bool {
        self.process.has_child_hint() || self.known_children || !self.children().is_empty()
    }

    /// Whether an expand affordance is offered.
    pub fn can_expand(&self, expanded: bool) -> bool {
        self.process.has_child_hint() || (expanded && !self.children().is_empty())
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Loading indicator replaces the child list of an expanded node
    /// until a list is mounted, including expansions not yet synced.
    pub fn shows_loading(&self) -> bool {
        self.children.is_none()
    }

    pub fn pending_reorder(&self) -> Option<&[ProcessId]> {
        self.pending_reorder.as_deref()
    }

    pub fn dragging(&self) -> Option<&ProcessId> {
        self.dragging.as_ref()
    }

    /// Overwrites the pending slot; earlier orders of the gesture are dropped.
    pub(crate) fn stash_reorder(&mut self, order: Vec<ProcessId>) {
        self.pending_reorder = Some(order);
    }

    /// Consumes the pending slot.
    pub(crate) fn take_reorder(&mut self) -> Option<Vec<ProcessId>> {
        self.pending_reorder.take()
    }

    /// Forget everything tied to the expanded state. Returns the
    /// child handles the caller must destroy.
    pub(crate) fn reset_children(&mut self) -> Vec<NodeId> {
        self.in_flight = None;
        self.seen = None;
        self.pending_reorder = None;
        self.dragging = None;
        self.children.take().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generational_arena::Arena;

    fn node(process: ProcessNode) -> HierarchyNode {
        HierarchyNode::new(process, 0, None)
    }

    #[test]
    fn given_no_hint_and_collapsed_when_checking_affordance_then_hidden() {
        let n = node(ProcessNode::new("p", "P"));

        assert!(!n.can_expand(false));
        assert!(!n.can_expand(true));
    }

    #[test]
    fn given_hint_when_checking_affordance_then_shown_even_collapsed() {
        let n = node(ProcessNode::new("p", "P").with_child_ids(["c"]));

        assert!(n.can_expand(false));
    }

    #[test]
    fn given_loaded_children_when_expanded_then_affordance_shown() {
        let mut arena = Arena::new();
        let child = arena.insert(());
        let mut n = node(ProcessNode::new("p", "P"));
        n.children = Some(vec![child]);

        assert!(n.can_expand(true));
        assert!(!n.can_expand(false));
        assert!(n.has_known_children());
    }

    #[test]
    fn given_pending_reorder_when_stashing_twice_then_last_wins() {
        let mut n = node(ProcessNode::new("p", "P"));

        n.stash_reorder(vec!["a".into(), "b".into()]);
        n.stash_reorder(vec!["b".into(), "a".into()]);

        assert_eq!(
            n.take_reorder(),
            Some(vec![ProcessId::new("b"), ProcessId::new("a")])
        );
        assert!(n.take_reorder().is_none());
    }

    #[test]
    fn given_nothing_mounted_when_checking_then_loading() {
        let mut n = node(ProcessNode::new("p", "P"));
        assert!(n.shows_loading());

        n.in_flight = Some(FetchTicket(1));
        assert!(n.shows_loading());

        n.children = Some(vec![]);
        assert!(!n.shows_loading());
        assert!(n.is_fetching());
    }

    #[test]
    fn given_reset_when_called_then_clears_transient_state() {
        let mut arena = Arena::new();
        let child = arena.insert(());
        let mut n = node(ProcessNode::new("p", "P"));
        n.children = Some(vec![child]);
        n.in_flight = Some(FetchTicket(3));
        n.stash_reorder(vec!["a".into()]);

        let dropped = n.reset_children();

        assert_eq!(dropped, vec![child]);
        assert!(!n.children_loaded());
        assert!(!n.has_known_children());
        assert!(!n.is_fetching());
        assert!(n.pending_reorder().is_none());
    }

    #[test]
    fn given_prior_fetch_with_children_when_reset_then_still_known() {
        let mut arena = Arena::new();
        let child = arena.insert(());
        let mut n = node(ProcessNode::new("p", "P"));
        n.children = Some(vec![child]);
        n.known_children = true;

        n.reset_children();

        assert!(n.has_known_children());
        assert!(!n.can_expand(false));
    }
}

//! Process hierarchy tree
//!
//! Headless state machine behind the tree view. It never performs I/O:
//! every backend interaction is queued as a [`TreeEffect`] and its
//! completion is fed back through [`ProcessTree::apply_fetch`] or
//! [`ProcessTree::apply_commit`]. All transitions are discrete events on
//! a single thread.
//!
//! Expansion lives in the injected registry, children lists in node
//! instances owned by the tree's arena. External registry mutations
//! become visible at the next [`ProcessTree::sync`].

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use generational_arena::Arena;
use tracing::{debug, instrument, warn};

use crate::domain::{
    ChildrenCache, DomainError, DomainResult, ExpansionSet, FetchTicket, HierarchyNode, NodeId,
    ProcessId, ProcessNode, SharedRegistry,
};

pub const REORDER_SUCCESS_MESSAGE: &str = "Ordem dos subprocessos atualizada!";
pub const REORDER_FAILURE_MESSAGE: &str = "Erro ao reordenar subprocessos";

/// Request to load the immediate children of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub node: NodeId,
    pub parent: ProcessId,
    pub ticket: FetchTicket,
}

/// Request to persist a new sibling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub node: NodeId,
    pub parent: ProcessId,
    pub ordered_ids: Vec<ProcessId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub detail: Option<String>,
}

/// Work the tree asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEffect {
    FetchChildren(FetchRequest),
    CommitReorder(CommitRequest),
    Notify(Notification),
    /// The add-subprocess affordance of this process was used.
    AddSubprocess(ProcessNode),
}

/// Result of a selection event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub process: ProcessNode,
    /// Selection opened the node as a side effect.
    pub auto_expanded: bool,
}

/// Why a fetch response was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discarded {
    NodeGone,
    Collapsed,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    /// Backend failed; the node now shows no subprocesses.
    Failed,
    Discarded(Discarded),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Authoritative order displayed.
    Confirmed,
    /// Optimistic order dropped, re-fetch issued.
    RolledBack,
    /// Node collapsed or destroyed meanwhile; only caches and notifications updated.
    Detached,
}

pub struct ProcessTree {
    arena: Arena<HierarchyNode>,
    roots: Vec<NodeId>,
    registry: SharedRegistry,
    cache: Rc<ChildrenCache>,
    selected: Option<ProcessId>,
    add_subprocess: bool,
    next_ticket: u64,
    effects: VecDeque<TreeEffect>,
}

impl ProcessTree {
    /// Mount `roots` bound to a registry and children cache owned by the caller.
    pub fn new(
        roots: Vec<ProcessNode>,
        registry: SharedRegistry,
        cache: Rc<ChildrenCache>,
    ) -> Self {
        let mut arena = Arena::new();
        let roots = roots
            .into_iter()
            .map(|process| arena.insert(HierarchyNode::new(process, 0, None)))
            .collect();
        let mut tree = Self {
            arena,
            roots,
            registry,
            cache,
            selected: None,
            add_subprocess: false,
            next_ticket: 0,
            effects: VecDeque::new(),
        };
        tree.sync();
        tree
    }

    /// Tree with its own isolated registry and cache.
    pub fn standalone(roots: Vec<ProcessNode>) -> Self {
        Self::new(roots, ExpansionSet::isolated(), ChildrenCache::shared())
    }

    /// Offer the add-subprocess affordance on every node.
    pub fn with_add_subprocess(mut self, enabled: bool) -> Self {
        self.add_subprocess = enabled;
        self
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Rc<ChildrenCache> {
        &self.cache
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, node: NodeId) -> Option<&HierarchyNode> {
        self.arena.get(node)
    }

    pub fn selected(&self) -> Option<&ProcessId> {
        self.selected.as_ref()
    }

    pub fn add_subprocess_enabled(&self) -> bool {
        self.add_subprocess
    }

    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.arena
            .get(node)
            .is_some_and(|n| self.registry.is_expanded(n.id()))
    }

    /// First mounted instance of `process`, depth-first.
    pub fn find(&self, process: &ProcessId) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            if let Some(n) = self.arena.get(idx) {
                if n.id() == process {
                    return Some(idx);
                }
                stack.extend(n.children().iter().rev().copied());
            }
        }
        None
    }

    /// Process ids currently displayed under `node`, in order.
    pub fn displayed_children(&self, node: NodeId) -> Vec<ProcessId> {
        self.arena
            .get(node)
            .map(|n| {
                n.children()
                    .iter()
                    .filter_map(|&c| self.arena.get(c).map(|child| child.id().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    pub fn drain_effects(&mut self) -> Vec<TreeEffect> {
        self.effects.drain(..).collect()
    }

    // ------------------------------------------------------------
    // Expansion and selection
    // ------------------------------------------------------------

    /// Flip the node's membership in the registry.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_expand(&mut self, node: NodeId) -> DomainResult<bool> {
        let id = self.process_id(node)?;
        let expanded = self.registry.toggle(&id);
        debug!("toggle {}: expanded={}", id, expanded);
        self.sync();
        Ok(expanded)
    }

    /// Select a node; a collapsed node with known children is opened.
    #[instrument(level = "debug", skip(self))]
    pub fn select(&mut self, node: NodeId) -> DomainResult<Selection> {
        let n = self.arena.get(node).ok_or(DomainError::UnknownNode)?;
        let process = n.process.clone();
        let known = n.has_known_children()
            || self
                .cache
                .cached(&process.id)
                .is_some_and(|children| !children.is_empty());
        let auto_expanded = known && !self.registry.is_expanded(&process.id);
        if auto_expanded {
            self.registry.expand(&process.id);
        }
        self.selected = Some(process.id.clone());
        self.sync();
        Ok(Selection {
            process,
            auto_expanded,
        })
    }

    /// Use the add-subprocess affordance. Returns false when the tree
    /// does not offer it.
    pub fn request_add_subprocess(&mut self, node: NodeId) -> DomainResult<bool> {
        let n = self.arena.get(node).ok_or(DomainError::UnknownNode)?;
        if !self.add_subprocess {
            return Ok(false);
        }
        self.effects
            .push_back(TreeEffect::AddSubprocess(n.process.clone()));
        Ok(true)
    }

    /// Caller-triggered re-fetch of an expanded node.
    pub fn refresh(&mut self, node: NodeId) -> DomainResult<bool> {
        let n = self.arena.get(node).ok_or(DomainError::UnknownNode)?;
        if !self.registry.is_expanded(n.id()) {
            return Ok(false);
        }
        if n.was_expanded {
            self.issue_fetch(node);
        }
        self.sync();
        Ok(true)
    }

    /// Expand every mounted node above `max_depth` that is known to have
    /// children. Returns how many nodes were opened.
    pub fn expand_to_depth(&mut self, max_depth: usize) -> usize {
        let ids: Vec<ProcessId> = self
            .arena
            .iter()
            .filter(|(_, n)| n.depth < max_depth && n.has_known_children())
            .map(|(_, n)| n.id().clone())
            .filter(|id| !self.registry.is_expanded(id))
            .collect();
        for id in &ids {
            self.registry.expand(id);
        }
        if !ids.is_empty() {
            self.sync();
        }
        ids.len()
    }

    /// Reconcile every mounted node with the registry and the cache:
    /// newly expanded or invalidated nodes fetch, collapsed nodes drop
    /// their children.
    pub fn sync(&mut self) {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            self.sync_node(node);
            if let Some(n) = self.arena.get(node) {
                stack.extend(n.children().iter().rev().copied());
            }
        }
    }

    fn sync_node(&mut self, node: NodeId) {
        let Some(n) = self.arena.get(node) else {
            return;
        };
        let id = n.id().clone();
        let was_expanded = n.was_expanded;
        let loaded = n.children_loaded();
        let fetching = n.is_fetching();
        let seen = n.seen;

        if !self.registry.is_expanded(&id) {
            if was_expanded || loaded || fetching {
                debug!("collapse {}", id);
                self.collapse_node(node);
            }
            return;
        }

        let stale = seen.is_some_and(|s| self.cache.is_stale(&id, s));
        if !was_expanded && !loaded {
            if let Some(cached) = self.cache.cached(&id) {
                self.mount_children(node, cached);
            }
        }
        if !was_expanded || stale {
            self.issue_fetch(node);
        }
        if let Some(n) = self.arena.get_mut(node) {
            n.was_expanded = true;
        }
    }

    fn issue_fetch(&mut self, node: NodeId) {
        let Some(n) = self.arena.get_mut(node) else {
            return;
        };
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        n.in_flight = Some(ticket);
        n.seen = Some(self.cache.stamp(&n.process.id));
        debug!("fetch children of {} ({:?})", n.process.id, ticket);
        self.effects.push_back(TreeEffect::FetchChildren(FetchRequest {
            node,
            parent: n.process.id.clone(),
            ticket,
        }));
    }

    fn collapse_node(&mut self, node: NodeId) {
        let dropped = match self.arena.get_mut(node) {
            Some(n) => {
                n.was_expanded = false;
                n.reset_children()
            }
            None => return,
        };
        self.destroy(dropped);
    }

    /// Remove node instances together with their subtrees.
    fn destroy(&mut self, nodes: Vec<NodeId>) {
        let mut stack = nodes;
        while let Some(idx) = stack.pop() {
            if let Some(removed) = self.arena.remove(idx) {
                stack.extend(removed.children.unwrap_or_default());
            }
        }
    }

    /// Replace the child list of `node`, keeping instances whose id survives.
    fn mount_children(&mut self, node: NodeId, list: Vec<ProcessNode>) {
        let (depth, previous) = match self.arena.get_mut(node) {
            Some(n) => (n.depth + 1, n.children.take().unwrap_or_default()),
            None => return,
        };
        let mut existing: HashMap<ProcessId, NodeId> = previous
            .iter()
            .filter_map(|&c| self.arena.get(c).map(|n| (n.id().clone(), c)))
            .collect();

        let mut order = Vec::with_capacity(list.len());
        for process in list {
            match existing.remove(&process.id) {
                Some(child) => {
                    if let Some(c) = self.arena.get_mut(child) {
                        c.process = process;
                    }
                    order.push(child);
                }
                None => order.push(
                    self.arena
                        .insert(HierarchyNode::new(process, depth, Some(node))),
                ),
            }
        }
        self.destroy(existing.into_values().collect());

        if let Some(n) = self.arena.get_mut(node) {
            n.known_children = !order.is_empty();
            n.children = Some(order);
        }
    }

    /// Apply a children fetch response. Responses for destroyed or
    /// collapsed nodes, and for superseded fetches, are dropped.
    #[instrument(level = "debug", skip(self, result), fields(parent = %request.parent))]
    pub fn apply_fetch(
        &mut self,
        request: &FetchRequest,
        result: Result<Vec<ProcessNode>, String>,
    ) -> FetchOutcome {
        let Some(n) = self.arena.get(request.node) else {
            debug!("discard fetch: node gone");
            return FetchOutcome::Discarded(Discarded::NodeGone);
        };
        if !n.was_expanded || !self.registry.is_expanded(n.id()) {
            debug!("discard fetch: collapsed");
            return FetchOutcome::Discarded(Discarded::Collapsed);
        }
        if n.in_flight != Some(request.ticket) {
            debug!("discard fetch: superseded by {:?}", n.in_flight);
            return FetchOutcome::Discarded(Discarded::Superseded);
        }
        let parent = n.id().clone();
        if let Some(n) = self.arena.get_mut(request.node) {
            n.in_flight = None;
        }

        let outcome = match result {
            Ok(children) => {
                self.cache.record(&parent, &children);
                let count = children.len();
                self.mount_children(request.node, children);
                FetchOutcome::Applied { count }
            }
            Err(message) => {
                warn!("fetch children of {} failed: {}", parent, message);
                self.mount_children(request.node, Vec::new());
                FetchOutcome::Failed
            }
        };
        self.sync();
        outcome
    }

    // ------------------------------------------------------------
    // Reordering
    // ------------------------------------------------------------

    /// Start dragging `child` within `parent`'s children. No backend call.
    pub fn drag_start(&mut self, parent: NodeId, child: &ProcessId) -> DomainResult<()> {
        let parent_id = self.ensure_loaded(parent)?;
        if !self.displayed_children(parent).contains(child) {
            return Err(DomainError::UnknownChild {
                parent: parent_id,
                child: child.clone(),
            });
        }
        if let Some(n) = self.arena.get_mut(parent) {
            n.dragging = Some(child.clone());
        }
        Ok(())
    }

    /// Intermediate reorder event: display `new_order` immediately and
    /// stash it as the pending order, replacing any earlier one.
    pub fn reorder(&mut self, parent: NodeId, new_order: Vec<ProcessId>) -> DomainResult<()> {
        let parent_id = self.ensure_loaded(parent)?;
        let mut remaining: Vec<(ProcessId, NodeId)> = self
            .arena
            .get(parent)
            .map(|n| {
                n.children()
                    .iter()
                    .filter_map(|&c| self.arena.get(c).map(|child| (child.id().clone(), c)))
                    .collect()
            })
            .unwrap_or_default();

        if remaining.len() != new_order.len() {
            return Err(DomainError::InvalidReorder {
                parent: parent_id,
                message: format!(
                    "expected {} children, got {}",
                    remaining.len(),
                    new_order.len()
                ),
            });
        }

        let mut handles = Vec::with_capacity(new_order.len());
        for id in &new_order {
            match remaining.iter().position(|(child, _)| child == id) {
                Some(pos) => handles.push(remaining.swap_remove(pos).1),
                None => {
                    return Err(DomainError::InvalidReorder {
                        parent: parent_id,
                        message: format!("{} is not a current child", id),
                    })
                }
            }
        }

        if let Some(n) = self.arena.get_mut(parent) {
            n.children = Some(handles);
            n.stash_reorder(new_order);
        }
        Ok(())
    }

    /// Move the child at `from` to position `to`.
    pub fn move_child(&mut self, parent: NodeId, from: usize, to: usize) -> DomainResult<()> {
        let parent_id = self.ensure_loaded(parent)?;
        let mut order = self.displayed_children(parent);
        if from >= order.len() || to >= order.len() {
            return Err(DomainError::InvalidReorder {
                parent: parent_id,
                message: format!(
                    "positions {} -> {} out of range for {} children",
                    from,
                    to,
                    order.len()
                ),
            });
        }
        let id = order.remove(from);
        order.insert(to, id);
        self.reorder(parent, order)
    }

    /// End of the drag gesture: commit the pending order, if any, and
    /// clear the slot so the next gesture commits on its own.
    #[instrument(level = "debug", skip(self))]
    pub fn drag_end(&mut self, parent: NodeId) -> DomainResult<Option<CommitRequest>> {
        let n = self
            .arena
            .get_mut(parent)
            .ok_or(DomainError::UnknownNode)?;
        n.dragging = None;
        let Some(ordered_ids) = n.take_reorder() else {
            return Ok(None);
        };
        let request = CommitRequest {
            node: parent,
            parent: n.id().clone(),
            ordered_ids,
        };
        debug!("commit reorder of {}: {:?}", request.parent, request.ordered_ids);
        self.effects
            .push_back(TreeEffect::CommitReorder(request.clone()));
        Ok(Some(request))
    }

    /// Apply a reorder commit response.
    #[instrument(level = "debug", skip(self, result), fields(parent = %request.parent))]
    pub fn apply_commit(
        &mut self,
        request: &CommitRequest,
        result: Result<Vec<ProcessNode>, String>,
    ) -> CommitOutcome {
        let attached = self.arena.get(request.node).is_some_and(|n| {
            n.id() == &request.parent && n.was_expanded && self.registry.is_expanded(n.id())
        });

        let outcome = match result {
            Ok(children) => {
                self.cache.invalidate(&request.parent);
                self.cache.invalidate_all();
                self.notify(NotificationLevel::Success, REORDER_SUCCESS_MESSAGE, None);
                if attached {
                    self.cache.record(&request.parent, &children);
                    let stamp = self.cache.stamp(&request.parent);
                    self.mount_children(request.node, children);
                    if let Some(n) = self.arena.get_mut(request.node) {
                        n.in_flight = None;
                        n.seen = Some(stamp);
                    }
                    CommitOutcome::Confirmed
                } else {
                    CommitOutcome::Detached
                }
            }
            Err(message) => {
                warn!("reorder of {} failed: {}", request.parent, message);
                self.notify(
                    NotificationLevel::Error,
                    REORDER_FAILURE_MESSAGE,
                    Some(message),
                );
                if attached {
                    self.issue_fetch(request.node);
                    CommitOutcome::RolledBack
                } else {
                    CommitOutcome::Detached
                }
            }
        };
        self.sync();
        outcome
    }

    fn notify(&mut self, level: NotificationLevel, message: &str, detail: Option<String>) {
        self.effects.push_back(TreeEffect::Notify(Notification {
            level,
            message: message.to_string(),
            detail,
        }));
    }

    fn process_id(&self, node: NodeId) -> DomainResult<ProcessId> {
        self.arena
            .get(node)
            .map(|n| n.id().clone())
            .ok_or(DomainError::UnknownNode)
    }

    fn ensure_loaded(&self, node: NodeId) -> DomainResult<ProcessId> {
        let n = self.arena.get(node).ok_or(DomainError::UnknownNode)?;
        if !self.registry.is_expanded(n.id()) {
            return Err(DomainError::NotExpanded(n.id().clone()));
        }
        if !n.children_loaded() {
            return Err(DomainError::ChildrenNotLoaded(n.id().clone()));
        }
        Ok(n.id().clone())
    }
}

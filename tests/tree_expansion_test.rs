//! Integration tests for expansion, fetching and selection in ProcessTree

use std::rc::Rc;

use procat::application::{Discarded, FetchOutcome, FetchRequest, ProcessTree, TreeEffect};
use procat::domain::{
    ChildrenCache, ExpansionRegistry, ExpansionSet, NodeId, ProcessId, ProcessNode,
};
use procat::util::testing;

fn pid(id: &str) -> ProcessId {
    ProcessId::new(id)
}

fn process(id: &str) -> ProcessNode {
    ProcessNode::new(id, id.to_uppercase())
}

fn parent_with(id: &str, children: &[&str]) -> ProcessNode {
    process(id).with_child_ids(children.iter().copied())
}

fn children(ids: &[&str], parent: &str) -> Vec<ProcessNode> {
    ids.iter().map(|id| process(id).with_parent(parent)).collect()
}

fn fetches(tree: &mut ProcessTree) -> Vec<FetchRequest> {
    tree.drain_effects()
        .into_iter()
        .filter_map(|e| match e {
            TreeEffect::FetchChildren(req) => Some(req),
            _ => None,
        })
        .collect()
}

fn single_fetch(tree: &mut ProcessTree) -> FetchRequest {
    let mut requests = fetches(tree);
    assert_eq!(requests.len(), 1, "expected exactly one fetch: {:?}", requests);
    requests.remove(0)
}

fn shown(tree: &ProcessTree, node: NodeId) -> Vec<String> {
    tree.displayed_children(node)
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

// ============================================================
// Registry
// ============================================================

#[test]
fn given_registry_when_expanding_twice_then_still_expanded() {
    let registry = ExpansionSet::new();

    registry.expand(&pid("p"));
    assert!(registry.is_expanded(&pid("p")));
    registry.expand(&pid("p"));
    assert!(registry.is_expanded(&pid("p")));

    registry.collapse(&pid("p"));
    assert!(!registry.is_expanded(&pid("p")));
    registry.collapse(&pid("p"));
    assert!(!registry.is_expanded(&pid("p")));
}

#[test]
fn given_two_trees_on_same_registry_when_one_toggles_then_other_observes() {
    testing::init_test_setup();
    let registry = ExpansionSet::shared();
    let cache = ChildrenCache::shared();
    let mut left = ProcessTree::new(
        vec![parent_with("p", &["a"])],
        Rc::clone(&registry),
        Rc::clone(&cache),
    );
    let mut right = ProcessTree::new(
        vec![parent_with("p", &["a"])],
        Rc::clone(&registry),
        Rc::clone(&cache),
    );
    let left_root = left.roots()[0];
    let right_root = right.roots()[0];

    left.toggle_expand(left_root).unwrap();

    assert!(right.is_expanded(right_root));
    right.sync();
    let req = single_fetch(&mut right);
    assert_eq!(req.parent, pid("p"));
    assert_eq!(fetches(&mut left).len(), 1);
}

// ============================================================
// Fetching
// ============================================================

#[test]
fn given_expanded_node_when_collapsed_before_response_then_response_discarded() {
    testing::init_test_setup();
    let mut tree = ProcessTree::standalone(vec![parent_with("a", &["x"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);

    tree.toggle_expand(root).unwrap();
    let outcome = tree.apply_fetch(&req, Ok(children(&["x"], "a")));

    assert_eq!(outcome, FetchOutcome::Discarded(Discarded::Collapsed));
    assert!(shown(&tree, root).is_empty());
    assert!(!tree.node(root).unwrap().children_loaded());
    assert!(tree.cache().cached(&pid("a")).is_none());
}

#[test]
fn given_reexpanded_node_when_old_response_arrives_then_superseded() {
    let mut tree = ProcessTree::standalone(vec![parent_with("a", &["x"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let first = single_fetch(&mut tree);
    tree.toggle_expand(root).unwrap();
    tree.toggle_expand(root).unwrap();
    let second = single_fetch(&mut tree);

    let stale = tree.apply_fetch(&first, Ok(children(&["old"], "a")));
    let fresh = tree.apply_fetch(&second, Ok(children(&["x", "y"], "a")));

    assert_eq!(stale, FetchOutcome::Discarded(Discarded::Superseded));
    assert_eq!(fresh, FetchOutcome::Applied { count: 2 });
    assert_eq!(shown(&tree, root), vec!["x", "y"]);
}

#[test]
fn given_collapse_and_reexpand_twice_then_two_fetches_and_latest_displayed() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["x", "y"])]);
    let root = tree.roots()[0];

    tree.toggle_expand(root).unwrap();
    let first = single_fetch(&mut tree);
    tree.apply_fetch(&first, Ok(children(&["x", "y"], "p")));
    assert_eq!(shown(&tree, root), vec!["x", "y"]);

    tree.toggle_expand(root).unwrap();
    tree.toggle_expand(root).unwrap();
    let second = single_fetch(&mut tree);
    assert_ne!(first.ticket, second.ticket);
    tree.apply_fetch(&second, Ok(children(&["y", "x", "z"], "p")));

    assert_eq!(shown(&tree, root), vec!["y", "x", "z"]);
}

#[test]
fn given_cached_children_when_reexpanded_then_shown_while_refetching() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["x"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let first = single_fetch(&mut tree);
    tree.apply_fetch(&first, Ok(children(&["x"], "p")));

    tree.toggle_expand(root).unwrap();
    tree.toggle_expand(root).unwrap();

    let node = tree.node(root).unwrap();
    assert!(node.is_fetching());
    assert!(!node.shows_loading());
    assert_eq!(shown(&tree, root), vec!["x"]);
    assert_eq!(fetches(&mut tree).len(), 1);
}

#[test]
fn given_fetch_failure_when_applied_then_children_empty() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["x"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);

    let outcome = tree.apply_fetch(&req, Err("Network Error".into()));

    assert_eq!(outcome, FetchOutcome::Failed);
    let node = tree.node(root).unwrap();
    assert!(node.children_loaded());
    assert!(node.children().is_empty());
    assert!(!node.is_fetching());
    assert!(!tree.has_effects());
}

#[test]
fn given_collapsed_parent_when_expanded_child_exists_then_child_handle_dies() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["c"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(vec![parent_with("c", &["g"]).with_parent("p")]));
    let child = tree.node(root).unwrap().children()[0];
    tree.toggle_expand(child).unwrap();
    let child_req = single_fetch(&mut tree);

    tree.toggle_expand(root).unwrap();

    assert!(tree.node(child).is_none());
    assert_eq!(
        tree.apply_fetch(&child_req, Ok(children(&["g"], "c"))),
        FetchOutcome::Discarded(Discarded::NodeGone)
    );
    // Child stays in the registry and reopens with its parent.
    assert!(tree.registry().is_expanded(&pid("c")));
}

#[test]
fn given_expanded_descendant_in_registry_when_parent_children_arrive_then_descendant_fetches() {
    let registry = ExpansionSet::shared();
    registry.expand(&pid("p"));
    registry.expand(&pid("c"));
    let mut tree = ProcessTree::new(
        vec![parent_with("p", &["c"])],
        Rc::clone(&registry),
        ChildrenCache::shared(),
    );
    let req = single_fetch(&mut tree);

    tree.apply_fetch(&req, Ok(vec![parent_with("c", &["g"]).with_parent("p")]));

    let nested = single_fetch(&mut tree);
    assert_eq!(nested.parent, pid("c"));
}

#[test]
fn given_invalidated_parent_in_cache_when_synced_then_refetches() {
    let cache = ChildrenCache::shared();
    let mut tree = ProcessTree::new(
        vec![parent_with("p", &["x"])],
        ExpansionSet::shared(),
        Rc::clone(&cache),
    );
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(children(&["x"], "p")));

    cache.invalidate(&pid("p"));
    tree.sync();

    assert_eq!(single_fetch(&mut tree).parent, pid("p"));
    assert_eq!(shown(&tree, root), vec!["x"]);
}

#[test]
fn given_expanded_node_when_refreshed_then_new_fetch_issued() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["x"])]);
    let root = tree.roots()[0];
    assert!(!tree.refresh(root).unwrap());

    tree.toggle_expand(root).unwrap();
    let first = single_fetch(&mut tree);
    assert!(tree.refresh(root).unwrap());
    let second = single_fetch(&mut tree);

    assert_eq!(
        tree.apply_fetch(&first, Ok(vec![])),
        FetchOutcome::Discarded(Discarded::Superseded)
    );
    assert_eq!(
        tree.apply_fetch(&second, Ok(children(&["x"], "p"))),
        FetchOutcome::Applied { count: 1 }
    );
}

// ============================================================
// Cross-flow expansion and selection
// ============================================================

#[test]
fn given_collapsed_parent_when_expanded_from_outside_then_next_sync_fetches() {
    let registry = ExpansionSet::shared();
    let mut tree = ProcessTree::new(
        vec![process("p")],
        Rc::clone(&registry),
        ChildrenCache::shared(),
    );
    let root = tree.roots()[0];
    assert!(!tree.has_effects());

    registry.expand(&pid("p"));
    tree.sync();

    assert!(tree.is_expanded(root));
    assert_eq!(single_fetch(&mut tree).parent, pid("p"));
}

#[test]
fn given_collapsed_node_with_hint_when_selected_then_expanded() {
    let registry = ExpansionSet::shared();
    let mut tree = ProcessTree::new(
        vec![parent_with("p", &["c"])],
        Rc::clone(&registry),
        ChildrenCache::shared(),
    );
    let root = tree.roots()[0];

    let selection = tree.select(root).unwrap();

    assert!(selection.auto_expanded);
    assert_eq!(selection.process.id, pid("p"));
    assert!(registry.is_expanded(&pid("p")));
    assert_eq!(tree.selected(), Some(&pid("p")));
    assert_eq!(single_fetch(&mut tree).parent, pid("p"));
}

#[test]
fn given_leaf_when_selected_then_not_expanded() {
    let registry = ExpansionSet::shared();
    let mut tree = ProcessTree::new(
        vec![process("leaf")],
        Rc::clone(&registry),
        ChildrenCache::shared(),
    );
    let root = tree.roots()[0];

    let selection = tree.select(root).unwrap();

    assert!(!selection.auto_expanded);
    assert!(!registry.is_expanded(&pid("leaf")));
    assert!(!tree.has_effects());
}

#[test]
fn given_hintless_node_fetched_then_collapsed_when_selected_then_expanded() {
    testing::init_test_setup();
    let mut tree = ProcessTree::standalone(vec![process("p")]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(children(&["a"], "p")));
    tree.toggle_expand(root).unwrap();
    assert!(!tree.is_expanded(root));

    let selection = tree.select(root).unwrap();

    assert!(selection.auto_expanded);
    assert!(tree.is_expanded(root));
    assert_eq!(single_fetch(&mut tree).parent, pid("p"));
}

#[test]
fn given_hintless_node_fetched_in_other_view_when_selected_then_expanded() {
    let cache = ChildrenCache::shared();
    let mut browsing = ProcessTree::new(
        vec![process("p")],
        ExpansionSet::shared(),
        Rc::clone(&cache),
    );
    let mut picking = ProcessTree::new(
        vec![process("p")],
        ExpansionSet::shared(),
        Rc::clone(&cache),
    );
    let browsing_root = browsing.roots()[0];
    browsing.toggle_expand(browsing_root).unwrap();
    let req = single_fetch(&mut browsing);
    browsing.apply_fetch(&req, Ok(children(&["a"], "p")));
    let root = picking.roots()[0];

    let selection = picking.select(root).unwrap();

    assert!(selection.auto_expanded);
    assert!(picking.is_expanded(root));
}

#[test]
fn given_prior_fetch_without_children_when_selected_then_not_expanded() {
    let mut tree = ProcessTree::standalone(vec![process("p")]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(vec![]));
    tree.toggle_expand(root).unwrap();

    let selection = tree.select(root).unwrap();

    assert!(!selection.auto_expanded);
    assert!(!tree.is_expanded(root));
    assert!(fetches(&mut tree).is_empty());
}

#[test]
fn given_expanded_node_when_selected_then_stays_expanded_without_auto_expand() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["a"])]);
    let root = tree.roots()[0];
    tree.toggle_expand(root).unwrap();
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(children(&["a"], "p")));

    let selection = tree.select(root).unwrap();

    assert!(!selection.auto_expanded);
    assert!(tree.is_expanded(root));
    assert_eq!(tree.selected(), Some(&pid("p")));
    assert_eq!(shown(&tree, root), vec!["a"]);
    assert!(fetches(&mut tree).is_empty());
}

#[test]
fn given_tree_without_add_affordance_when_requested_then_no_effect() {
    let mut tree = ProcessTree::standalone(vec![process("p")]);
    let root = tree.roots()[0];
    assert!(!tree.request_add_subprocess(root).unwrap());

    let mut tree = tree.with_add_subprocess(true);
    assert!(tree.request_add_subprocess(root).unwrap());

    assert!(matches!(
        tree.drain_effects().as_slice(),
        [TreeEffect::AddSubprocess(p)] if p.id == pid("p")
    ));
}

#[test]
fn given_hints_when_expanding_to_depth_then_only_shallow_nodes_open() {
    let mut tree = ProcessTree::standalone(vec![parent_with("p", &["c"]), process("leaf")]);

    assert_eq!(tree.expand_to_depth(1), 1);
    let req = single_fetch(&mut tree);
    tree.apply_fetch(&req, Ok(vec![parent_with("c", &["g"]).with_parent("p")]));

    assert_eq!(tree.expand_to_depth(1), 0);
    assert!(!tree.registry().is_expanded(&pid("c")));
    assert_eq!(tree.expand_to_depth(2), 1);
    assert!(tree.registry().is_expanded(&pid("c")));
}

//! Integration tests for ProcessService

use std::rc::Rc;
use std::sync::Arc;

use procat::application::services::{ProcessService, RootFilter};
use procat::application::{ApplicationError, ProcessTree, TreeDriver};
use procat::domain::{
    ChildrenCache, ExpansionRegistry, ExpansionSet, NewProcess, ProcessId, ProcessNode,
    ProcessStatus, ProcessType,
};
use procat::infrastructure::memory::BackendCall;
use procat::infrastructure::InMemoryBackend;
use procat::util::testing;
use rstest::rstest;

fn pid(id: &str) -> ProcessId {
    ProcessId::new(id)
}

fn in_department(mut p: ProcessNode, department: &str) -> ProcessNode {
    p.department_id = department.to_string();
    p
}

fn first_child(mut p: ProcessNode) -> ProcessNode {
    p.order = Some(0);
    p
}

fn backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::from_processes(vec![
        in_department(ProcessNode::new("p", "Compras"), "d1"),
        in_department(first_child(ProcessNode::new("a", "Cotação").with_parent("p")), "d1"),
        in_department(ProcessNode::new("q", "Contas a pagar"), "d1"),
        in_department(ProcessNode::new("r", "Recrutamento"), "d2"),
    ]))
}

fn draft(name: &str) -> NewProcess {
    NewProcess {
        name: name.to_string(),
        description: Some("criado em teste".into()),
        process_type: ProcessType::Systemic,
        status: ProcessStatus::InReview,
        department_id: String::new(),
        parent_id: None,
    }
}

#[rstest]
#[case::global(None, None, &["p", "q", "r"])]
#[case::department(Some("d1"), None, &["p", "q"])]
#[case::search(None, Some("CONTAS"), &["q"])]
#[case::blank_search(Some("d2"), Some("  "), &["r"])]
#[tokio::test]
async fn given_filter_when_listing_roots_then_only_parentless_matches(
    #[case] department: Option<&str>,
    #[case] search: Option<&str>,
    #[case] expected: &[&str],
) {
    testing::init_test_setup();
    let service = ProcessService::new(backend());
    let filter = RootFilter {
        department: department.map(str::to_string),
        search: search.map(str::to_string),
    };

    let roots = service.list_roots(&filter).await.unwrap();

    let ids: Vec<&str> = roots.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn given_department_filter_when_listing_then_uses_department_endpoint() {
    let backend = backend();
    let service = ProcessService::new(backend.clone());

    service
        .list_roots(&RootFilter {
            department: Some("d1".into()),
            search: None,
        })
        .await
        .unwrap();

    assert_eq!(backend.calls(), vec![BackendCall::ListDepartment("d1".into())]);
}

#[tokio::test]
async fn given_unknown_process_when_fetching_then_not_found() {
    let service = ProcessService::new(backend());

    let err = service.process(&pid("missing")).await.unwrap_err();

    assert!(matches!(err, ApplicationError::NotFound(_)));
}

#[tokio::test]
async fn given_subprocess_created_then_parent_expanded_and_inherits_department() {
    testing::init_test_setup();
    let service = ProcessService::new(backend());
    let registry = ExpansionSet::new();
    let cache = ChildrenCache::new();
    let seen = cache.stamp(&pid("p"));

    let created = service
        .create_subprocess(&pid("p"), draft("  Aprovação  "), &registry, &cache)
        .await
        .unwrap();

    assert_eq!(created.name, "Aprovação");
    assert_eq!(created.parent_id, Some(pid("p")));
    assert_eq!(created.department_id, "d1");
    assert!(registry.is_expanded(&pid("p")));
    assert!(cache.is_stale(&pid("p"), seen));
}

#[tokio::test]
async fn given_blank_name_when_creating_then_validation_error_and_no_expand() {
    let backend = backend();
    let service = ProcessService::new(backend.clone());
    let registry = ExpansionSet::new();

    let err = service
        .create_subprocess(&pid("p"), draft("   "), &registry, &ChildrenCache::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Validation { .. }));
    assert!(!registry.is_expanded(&pid("p")));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn given_open_tree_when_subprocess_created_then_tree_shows_it() {
    let backend = backend();
    let service = ProcessService::new(backend.clone());
    let registry = ExpansionSet::shared();
    let cache = ChildrenCache::shared();
    let roots = service.list_roots(&RootFilter::default()).await.unwrap();
    let mut tree = ProcessTree::new(roots, Rc::clone(&registry), Rc::clone(&cache));
    let mut driver = TreeDriver::new(backend.clone());
    let parent = tree.find(&pid("p")).unwrap();
    assert!(!tree.is_expanded(parent));

    let created = service
        .create_subprocess(&pid("p"), draft("Aprovação"), registry.as_ref(), &cache)
        .await
        .unwrap();
    tree.sync();
    driver.run_until_idle(&mut tree).await;

    assert!(tree.is_expanded(parent));
    assert_eq!(tree.displayed_children(parent), vec![pid("a"), created.id]);
}

#[tokio::test]
async fn given_reorder_through_service_then_caches_invalidated() {
    let backend = Arc::new(InMemoryBackend::from_processes(vec![
        ProcessNode::new("p", "P"),
        ProcessNode::new("a", "A").with_parent("p"),
        ProcessNode::new("b", "B").with_parent("p"),
    ]));
    let service = ProcessService::new(backend);
    let cache = ChildrenCache::new();
    let seen = cache.stamp(&pid("x"));

    let children = service
        .reorder(&pid("p"), &[pid("b"), pid("a")], &cache)
        .await
        .unwrap();

    let ids: Vec<&str> = children.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(cache.is_stale(&pid("x"), seen));
}

//! Process service: catalog listing and subprocess creation.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, InfraResultExt};
use crate::domain::{ChildrenCache, ExpansionRegistry, NewProcess, ProcessId, ProcessNode};
use crate::infrastructure::ProcessBackend;

/// Page size used when listing a department's processes.
pub const ROOT_PAGE_LIMIT: u32 = 100;

/// Which top-level processes to list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFilter {
    pub department: Option<String>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

pub struct ProcessService {
    backend: Arc<dyn ProcessBackend>,
}

impl ProcessService {
    pub fn new(backend: Arc<dyn ProcessBackend>) -> Self {
        Self { backend }
    }

    /// Processes without a parent, department-scoped when requested.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_roots(&self, filter: &RootFilter) -> ApplicationResult<Vec<ProcessNode>> {
        let processes = match &filter.department {
            Some(department) => {
                self.backend
                    .list_department_processes(department, 1, ROOT_PAGE_LIMIT)
                    .await
                    .with_context("list department processes", department)?
                    .data
            }
            None => self
                .backend
                .list_processes()
                .await
                .with_context("list processes", "all")?,
        };

        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let roots: Vec<ProcessNode> = processes
            .into_iter()
            .filter(ProcessNode::is_root)
            .filter(|p| match &needle {
                Some(needle) => p.name.to_lowercase().contains(needle),
                None => true,
            })
            .collect();
        debug!("{} root processes", roots.len());
        Ok(roots)
    }

    pub async fn children(&self, parent: &ProcessId) -> ApplicationResult<Vec<ProcessNode>> {
        self.backend
            .fetch_children(parent)
            .await
            .with_context("fetch children", parent)
    }

    pub async fn process(&self, id: &ProcessId) -> ApplicationResult<ProcessNode> {
        self.backend
            .get_process(id)
            .await
            .with_context("fetch process", id)
    }

    /// Persist a new order for `parent`'s children outside any tree.
    pub async fn reorder(
        &self,
        parent: &ProcessId,
        ordered_ids: &[ProcessId],
        cache: &ChildrenCache,
    ) -> ApplicationResult<Vec<ProcessNode>> {
        let children = self
            .backend
            .commit_reorder(parent, ordered_ids)
            .await
            .with_context("reorder children", parent)?;
        cache.invalidate(parent);
        cache.invalidate_all();
        Ok(children)
    }

    /// Create `draft` under `parent`, invalidate the parent's children and
    /// open the parent in `registry` so the new subprocess becomes visible.
    #[instrument(level = "debug", skip(self, draft, registry, cache), fields(name = %draft.name))]
    pub async fn create_subprocess(
        &self,
        parent: &ProcessId,
        mut draft: NewProcess,
        registry: &dyn ExpansionRegistry,
        cache: &ChildrenCache,
    ) -> ApplicationResult<ProcessNode> {
        draft.name = draft.name.trim().to_string();
        if draft.name.is_empty() {
            return Err(ApplicationError::Validation {
                message: "process name must not be empty".into(),
            });
        }
        if draft.department_id.is_empty() {
            draft.department_id = self.process(parent).await?.department_id;
        }
        draft.parent_id = Some(parent.clone());

        let created = self
            .backend
            .create_process(&draft)
            .await
            .with_context("create subprocess", parent)?;
        debug!("created {} under {}", created.id, parent);

        cache.invalidate(parent);
        registry.expand(parent);
        Ok(created)
    }
}

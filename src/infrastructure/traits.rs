//! I/O boundary traits for testability
//!
//! The catalog backend is abstracted so the tree driver and services can
//! run against the REST API or an in-memory fixture.

use async_trait::async_trait;

use crate::domain::{NewProcess, Page, ProcessId, ProcessNode};
use crate::infrastructure::InfraResult;

/// Catalog backend.
#[async_trait]
pub trait ProcessBackend: Send + Sync {
    /// Immediate children of `parent`, in sibling order.
    async fn fetch_children(&self, parent: &ProcessId) -> InfraResult<Vec<ProcessNode>>;

    /// Persist a new order of `parent`'s children; returns the
    /// authoritative children list.
    async fn commit_reorder(
        &self,
        parent: &ProcessId,
        ordered_ids: &[ProcessId],
    ) -> InfraResult<Vec<ProcessNode>>;

    /// All processes of the catalog.
    async fn list_processes(&self) -> InfraResult<Vec<ProcessNode>>;

    /// One page of a department's processes.
    async fn list_department_processes(
        &self,
        department: &str,
        page: u32,
        limit: u32,
    ) -> InfraResult<Page<ProcessNode>>;

    async fn get_process(&self, id: &ProcessId) -> InfraResult<ProcessNode>;

    async fn create_process(&self, draft: &NewProcess) -> InfraResult<ProcessNode>;
}

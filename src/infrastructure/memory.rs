//! In-memory [`ProcessBackend`] over a flat list of processes.
//!
//! Serves `--fixture` runs of the CLI and the driver tests. Failures can be
//! injected per operation; every call is recorded.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{NewProcess, Page, PageMeta, ProcessId, ProcessNode};
use crate::infrastructure::traits::ProcessBackend;
use crate::infrastructure::{InfraError, InfraResult};

/// Backend call, as recorded by [`InMemoryBackend::calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchChildren(ProcessId),
    CommitReorder(ProcessId, Vec<ProcessId>),
    ListProcesses,
    ListDepartment(String),
    GetProcess(ProcessId),
    CreateProcess(String),
}

#[derive(Debug, Default)]
struct State {
    processes: Vec<ProcessNode>,
    fail_fetches: bool,
    fail_reorders: bool,
    next_id: u64,
    calls: Vec<BackendCall>,
}

impl State {
    fn position(&self, id: &ProcessId) -> Option<usize> {
        self.processes.iter().position(|p| &p.id == id)
    }

    /// Children of `parent` sorted by order, hints filled in.
    fn children_of(&self, parent: &ProcessId) -> Vec<ProcessNode> {
        let mut children: Vec<ProcessNode> = self
            .processes
            .iter()
            .filter(|p| p.parent_id.as_ref() == Some(parent))
            .map(|p| self.with_hints(p))
            .collect();
        children.sort_by_key(|p| p.order.unwrap_or(i64::MAX));
        children
    }

    fn with_hints(&self, process: &ProcessNode) -> ProcessNode {
        let mut process = process.clone();
        let mut ids: Vec<(i64, ProcessId)> = self
            .processes
            .iter()
            .filter(|p| p.parent_id.as_ref() == Some(&process.id))
            .map(|p| (p.order.unwrap_or(i64::MAX), p.id.clone()))
            .collect();
        ids.sort();
        process.children_ids = Some(ids.into_iter().map(|(_, id)| id).collect());
        process
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_processes(processes: Vec<ProcessNode>) -> Self {
        let backend = Self::new();
        backend.lock().processes = processes;
        backend
    }

    /// Load a JSON array of processes.
    pub fn load_fixture(path: &Path) -> InfraResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InfraError::io(format!("read fixture {}", path.display()), e))?;
        let processes: Vec<ProcessNode> = serde_json::from_str(&content)
            .map_err(|e| InfraError::decode(format!("fixture {}", path.display()), e))?;
        debug!("loaded {} processes from {}", processes.len(), path.display());
        Ok(Self::from_processes(processes))
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.lock().fail_fetches = fail;
    }

    pub fn set_fail_reorders(&self, fail: bool) {
        self.lock().fail_reorders = fail;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of children fetches issued for `parent`.
    pub fn fetch_count(&self, parent: &ProcessId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::FetchChildren(p) if p == parent))
            .count()
    }

    /// Insert or replace a process.
    pub fn upsert(&self, process: ProcessNode) {
        let mut state = self.lock();
        match state.position(&process.id) {
            Some(pos) => state.processes[pos] = process,
            None => state.processes.push(process),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: &ProcessId) -> InfraError {
    InfraError::Http {
        status: 404,
        message: format!("Processo {} não encontrado", id),
    }
}

#[async_trait]
impl ProcessBackend for InMemoryBackend {
    async fn fetch_children(&self, parent: &ProcessId) -> InfraResult<Vec<ProcessNode>> {
        let mut state = self.lock();
        state.calls.push(BackendCall::FetchChildren(parent.clone()));
        if state.fail_fetches {
            return Err(InfraError::Http {
                status: 503,
                message: "Service Unavailable".into(),
            });
        }
        if state.position(parent).is_none() {
            return Err(not_found(parent));
        }
        Ok(state.children_of(parent))
    }

    async fn commit_reorder(
        &self,
        parent: &ProcessId,
        ordered_ids: &[ProcessId],
    ) -> InfraResult<Vec<ProcessNode>> {
        let mut state = self.lock();
        state
            .calls
            .push(BackendCall::CommitReorder(parent.clone(), ordered_ids.to_vec()));
        if state.fail_reorders {
            return Err(InfraError::Http {
                status: 500,
                message: "Falha ao salvar a ordem".into(),
            });
        }
        if state.position(parent).is_none() {
            return Err(not_found(parent));
        }

        let mut current: Vec<ProcessId> = state
            .children_of(parent)
            .into_iter()
            .map(|p| p.id)
            .collect();
        let mut requested = ordered_ids.to_vec();
        current.sort();
        requested.sort();
        if current != requested {
            return Err(InfraError::Http {
                status: 400,
                message: "A lista deve conter exatamente os subprocessos atuais".into(),
            });
        }

        let positions: HashMap<&ProcessId, i64> = ordered_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i as i64))
            .collect();
        for process in state.processes.iter_mut() {
            if let Some(&order) = positions.get(&process.id) {
                process.order = Some(order);
            }
        }
        Ok(state.children_of(parent))
    }

    async fn list_processes(&self) -> InfraResult<Vec<ProcessNode>> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ListProcesses);
        Ok(state.processes.iter().map(|p| state.with_hints(p)).collect())
    }

    async fn list_department_processes(
        &self,
        department: &str,
        page: u32,
        limit: u32,
    ) -> InfraResult<Page<ProcessNode>> {
        let mut state = self.lock();
        state
            .calls
            .push(BackendCall::ListDepartment(department.to_string()));
        let all: Vec<ProcessNode> = state
            .processes
            .iter()
            .filter(|p| p.department_id == department)
            .map(|p| state.with_hints(p))
            .collect();
        let limit = limit.max(1);
        let page = page.max(1);
        let total = all.len() as u64;
        let data = all
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(Page {
            data,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages: total.div_ceil(u64::from(limit)) as u32,
            },
        })
    }

    async fn get_process(&self, id: &ProcessId) -> InfraResult<ProcessNode> {
        let mut state = self.lock();
        state.calls.push(BackendCall::GetProcess(id.clone()));
        let pos = state.position(id).ok_or_else(|| not_found(id))?;
        Ok(state.with_hints(&state.processes[pos]))
    }

    async fn create_process(&self, draft: &NewProcess) -> InfraResult<ProcessNode> {
        let mut state = self.lock();
        state.calls.push(BackendCall::CreateProcess(draft.name.clone()));
        if let Some(parent) = &draft.parent_id {
            if state.position(parent).is_none() {
                return Err(not_found(parent));
            }
        }
        state.next_id += 1;
        let order = draft
            .parent_id
            .as_ref()
            .map(|parent| state.children_of(parent).len() as i64);
        let process = ProcessNode {
            id: ProcessId::new(format!("new-{}", state.next_id)),
            name: draft.name.clone(),
            description: draft.description.clone(),
            process_type: draft.process_type,
            status: draft.status,
            department_id: draft.department_id.clone(),
            parent_id: draft.parent_id.clone(),
            order,
            children: None,
            children_ids: None,
        };
        state.processes.push(process.clone());
        Ok(process)
    }
}

//! Domain entities: process records as exchanged with the catalog backend

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a process in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProcessId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// How a process is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    Manual,
    Systemic,
}

impl ProcessType {
    /// Fixed display label.
    pub fn label(self) -> &'static str {
        match self {
            ProcessType::Manual => "Manual",
            ProcessType::Systemic => "Sistêmico",
        }
    }
}

/// Lifecycle status of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Active,
    InReview,
    Deprecated,
}

impl ProcessStatus {
    /// Fixed display label.
    pub fn label(self) -> &'static str {
        match self {
            ProcessStatus::Active => "Ativo",
            ProcessStatus::InReview => "Em Revisão",
            ProcessStatus::Deprecated => "Descontinuado",
        }
    }
}

/// Eagerly included child summary. Only the id is relied upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub id: ProcessId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A process as returned by the catalog backend.
///
/// `children` / `children_ids` are hints only: they decide whether an
/// expand affordance is offered before the children were ever fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNode {
    pub id: ProcessId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub process_type: ProcessType,
    pub status: ProcessStatus,
    #[serde(default)]
    pub department_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProcessId>,
    /// Position among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ChildSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_ids: Option<Vec<ProcessId>>,
}

impl ProcessNode {
    /// Minimal manual, active process without department or hints.
    pub fn new(id: impl Into<ProcessId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            process_type: ProcessType::Manual,
            status: ProcessStatus::Active,
            department_id: String::new(),
            parent_id: None,
            order: None,
            children: None,
            children_ids: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ProcessId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_type(mut self, process_type: ProcessType) -> Self {
        self.process_type = process_type;
        self
    }

    pub fn with_status(mut self, status: ProcessStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_child_ids<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ProcessId>,
    {
        self.children_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// True if the eager hint lists at least one child.
    pub fn has_child_hint(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
            || self.children_ids.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Payload for creating a process (`POST /processes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcess {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub process_type: ProcessType,
    pub status: ProcessStatus,
    pub department_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProcessId>,
}

/// Paging metadata of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// Paginated listing as returned by department-scoped endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

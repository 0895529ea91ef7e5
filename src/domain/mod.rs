//! Domain layer: process entities and hierarchy state
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod cache;
pub mod entities;
pub mod error;
pub mod node;
pub mod registry;

pub use cache::{CacheStamp, ChildrenCache};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use node::{FetchTicket, HierarchyNode, NodeId};
pub use registry::{ExpansionRegistry, ExpansionSet, SharedRegistry};

//! Application layer: tree state machine, rendering and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod driver;
pub mod error;
pub mod error_ext;
pub mod render;
pub mod services;
pub mod tree;

pub use driver::TreeDriver;
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::InfraResultExt;
pub use tree::{
    CommitOutcome, CommitRequest, Discarded, FetchOutcome, FetchRequest, Notification,
    NotificationLevel, ProcessTree, Selection, TreeEffect, REORDER_FAILURE_MESSAGE,
    REORDER_SUCCESS_MESSAGE,
};

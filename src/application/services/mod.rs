//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (ProcessBackend)
//! but are themselves concrete structs, not traits.

mod process;

pub use process::{ProcessService, RootFilter, ROOT_PAGE_LIMIT};

//! Infrastructure layer: backend implementations
//!
//! This layer implements I/O boundary traits.

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use http::HttpProcessBackend;
pub use memory::InMemoryBackend;
pub use traits::ProcessBackend;

//! procat: client for a process catalog.
//!
//! Layers, innermost first:
//! - [`domain`]: process entities, expansion registry, children cache
//! - [`application`]: headless tree state machine, rendering, services
//! - [`infrastructure`]: catalog backends (REST, in-memory)
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;

pub mod util {
    pub mod path;
    pub mod testing;
}

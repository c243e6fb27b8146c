//! ShowGraph library crate
//!
//! Re-exports core modules for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod recommendation;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use graph::{GraphDatabase, Neo4jStore};
pub use recommendation::*;

//! Public API for the execution engine
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::engine::error::{EngineError, EngineResult};
pub use crate::engine::manager::Engine;
pub use crate::engine::types::{CancellationToken, DEFAULT_WORKER_CAPACITY};

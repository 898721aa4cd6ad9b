//! Public API for the storage subsystem
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::storage::error::{StorageError, StorageResult};
pub use crate::storage::memory::MemoryStore;
pub use crate::storage::traits::JobStore;
pub use crate::storage::types::{AssetRecord, Job, JobStatus, LogEntry, LogLevel, VulnRecord};

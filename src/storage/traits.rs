//! Storage collaborator contract
//!
//! The engine relies on this narrow interface for every durable write;
//! implementations must guarantee atomic single-row inserts and updates.
//! The engine never spans a transaction over multiple findings.

use crate::plugin::config::ScanConfig;
use crate::plugin::findings::Severity;
use crate::storage::error::StorageResult;
use crate::storage::types::LogLevel;
use std::collections::HashMap;

/// Durable storage operations consumed by the execution engine
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job row in `queued` state, returning the new job id
    async fn create_job(
        &self,
        workspace_id: i64,
        job_type: &str,
        config: &ScanConfig,
    ) -> StorageResult<i64>;

    /// Transition a job to `running`
    async fn start_job(&self, job_id: i64) -> StorageResult<()>;

    /// Transition a job to `done` with its aggregate finding count.
    /// Must be a no-op when the job is already terminal.
    async fn finish_job(&self, job_id: i64, result_count: usize) -> StorageResult<()>;

    /// Transition a job to `error` with a message.
    /// Must be a no-op when the job is already terminal.
    async fn fail_job(&self, job_id: i64, message: &str) -> StorageResult<()>;

    /// Append a plugin log entry for a job
    async fn append_log(
        &self,
        job_id: i64,
        plugin_id: &str,
        message: &str,
        level: LogLevel,
        data: HashMap<String, serde_json::Value>,
    ) -> StorageResult<()>;

    /// Persist a discovered asset, returning the new asset id
    async fn add_asset(
        &self,
        target_id: i64,
        kind: &str,
        value: &str,
        source: &str,
        metadata: &HashMap<String, serde_json::Value>,
    ) -> StorageResult<i64>;

    /// Persist a vulnerability, optionally linked to an asset
    #[allow(clippy::too_many_arguments)]
    async fn add_vulnerability(
        &self,
        target_id: i64,
        plugin_id: &str,
        name: &str,
        severity: Severity,
        description: &str,
        evidence: &HashMap<String, serde_json::Value>,
        cve: Option<&str>,
        cvss: Option<f64>,
        asset_id: Option<i64>,
    ) -> StorageResult<()>;
}

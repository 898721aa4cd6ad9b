//! In-memory reference store
//!
//! Implements `JobStore` with plain maps behind a mutex. Used by the test
//! suite and the demo CLI; the read-side accessors expose what a UI would
//! query from a real database.

use crate::core::sync::handle_mutex_poison;
use crate::plugin::config::ScanConfig;
use crate::plugin::findings::Severity;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::JobStore;
use crate::storage::types::{AssetRecord, Job, JobStatus, LogEntry, LogLevel, VulnRecord};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

#[derive(Default)]
struct MemoryInner {
    jobs: HashMap<i64, Job>,
    logs: Vec<LogEntry>,
    assets: Vec<AssetRecord>,
    vulns: Vec<VulnRecord>,
    next_job_id: i64,
    next_asset_id: i64,
}

/// Map-backed `JobStore` implementation
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, MemoryInner>> {
        handle_mutex_poison(self.inner.lock(), |message| StorageError::Backend {
            message,
        })
    }

    /// Read a job snapshot
    pub fn job(&self, job_id: i64) -> Option<Job> {
        self.inner.lock().ok()?.jobs.get(&job_id).cloned()
    }

    /// All log entries appended for a job, in append order
    pub fn logs_for_job(&self, job_id: i64) -> Vec<LogEntry> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .logs
                    .iter()
                    .filter(|entry| entry.job_id == job_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Assets persisted for a target, in insertion order
    pub fn assets_for_target(&self, target_id: i64) -> Vec<AssetRecord> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .assets
                    .iter()
                    .filter(|asset| asset.target_id == target_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Vulnerabilities persisted for a target, in insertion order
    pub fn vulns_for_target(&self, target_id: i64) -> Vec<VulnRecord> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .vulns
                    .iter()
                    .filter(|vuln| vuln.target_id == target_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Vulnerabilities for a target ordered most severe first; entries of
    /// equal severity keep their insertion order
    pub fn vulns_by_severity(&self, target_id: i64) -> Vec<VulnRecord> {
        let mut vulns = self.vulns_for_target(target_id);
        vulns.sort_by_key(|vuln| std::cmp::Reverse(vuln.severity));
        vulns
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryStore {
    async fn create_job(
        &self,
        workspace_id: i64,
        job_type: &str,
        config: &ScanConfig,
    ) -> StorageResult<i64> {
        let snapshot =
            serde_json::to_value(config).map_err(|e| StorageError::Backend {
                message: format!("failed to snapshot config: {}", e),
            })?;

        let mut inner = self.lock()?;
        inner.next_job_id += 1;
        let job_id = inner.next_job_id;
        inner.jobs.insert(
            job_id,
            Job {
                id: job_id,
                workspace_id,
                job_type: job_type.to_string(),
                status: JobStatus::Queued,
                config: snapshot,
                result_count: 0,
                started_at: None,
                finished_at: None,
                error: None,
                created_at: SystemTime::now(),
            },
        );
        Ok(job_id)
    }

    async fn start_job(&self, job_id: i64) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(StorageError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        if job.status == JobStatus::Queued {
            job.status = JobStatus::Running;
            job.started_at = Some(SystemTime::now());
        }
        Ok(())
    }

    async fn finish_job(&self, job_id: i64, result_count: usize) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(StorageError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        // Status is monotonic: a cancelled or failed job stays that way
        if !job.status.is_terminal() {
            job.status = JobStatus::Done;
            job.result_count = result_count;
            job.finished_at = Some(SystemTime::now());
        }
        Ok(())
    }

    async fn fail_job(&self, job_id: i64, message: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(StorageError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        if !job.status.is_terminal() {
            job.status = JobStatus::Error;
            job.error = Some(message.to_string());
            job.finished_at = Some(SystemTime::now());
        }
        Ok(())
    }

    async fn append_log(
        &self,
        job_id: i64,
        plugin_id: &str,
        message: &str,
        level: LogLevel,
        data: HashMap<String, serde_json::Value>,
    ) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.logs.push(LogEntry {
            job_id,
            plugin_id: plugin_id.to_string(),
            level,
            message: message.to_string(),
            data,
            ts: SystemTime::now(),
        });
        Ok(())
    }

    async fn add_asset(
        &self,
        target_id: i64,
        kind: &str,
        value: &str,
        source: &str,
        metadata: &HashMap<String, serde_json::Value>,
    ) -> StorageResult<i64> {
        let mut inner = self.lock()?;
        inner.next_asset_id += 1;
        let asset_id = inner.next_asset_id;
        inner.assets.push(AssetRecord {
            id: asset_id,
            target_id,
            kind: kind.to_string(),
            value: value.to_string(),
            source: source.to_string(),
            metadata: metadata.clone(),
            discovered_at: SystemTime::now(),
        });
        Ok(asset_id)
    }

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
    ) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.vulns.push(VulnRecord {
            target_id,
            plugin_id: plugin_id.to_string(),
            name: name.to_string(),
            severity,
            description: description.to_string(),
            evidence: evidence.clone(),
            cve: cve.map(|s| s.to_string()),
            cvss,
            asset_id,
            found_at: SystemTime::now(),
        });
        Ok(())
    }
}

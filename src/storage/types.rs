//! Storage record types
//!
//! Durable entities exchanged with the storage collaborator: jobs, log
//! entries, assets and vulnerabilities.

use crate::plugin::findings::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use strum_macros::{Display, EnumString};

/// Job lifecycle states
///
/// Transitions are monotonic: queued -> running -> {done | error |
/// cancelled}. Once terminal a job never changes state again; the store
/// enforces this so a late finalisation cannot overwrite a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Cancelled)
    }
}

/// Log levels for plugin log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Mapping used when mirroring plugin logs to the process logger
    pub fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// One engine invocation against a set of plugins and a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub workspace_id: i64,
    pub job_type: String,
    pub status: JobStatus,
    /// Snapshot of the scan config at creation time
    pub config: serde_json::Value,
    pub result_count: usize,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
    pub error: Option<String>,
    pub created_at: SystemTime,
}

/// Append-only log line produced through the engine's logging hook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub job_id: i64,
    pub plugin_id: String,
    pub level: LogLevel,
    pub message: String,
    pub data: HashMap<String, serde_json::Value>,
    pub ts: SystemTime,
}

/// Persisted asset record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub target_id: i64,
    /// Asset classification (subdomain, url, service, endpoint, ...)
    pub kind: String,
    pub value: String,
    /// Plugin id that discovered the asset
    pub source: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub discovered_at: SystemTime,
}

/// Persisted vulnerability record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnRecord {
    pub target_id: i64,
    pub plugin_id: String,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub evidence: HashMap<String, serde_json::Value>,
    pub cve: Option<String>,
    pub cvss: Option<f64>,
    /// Asset the vulnerability was found on, when known
    pub asset_id: Option<i64>,
    pub found_at: SystemTime,
}

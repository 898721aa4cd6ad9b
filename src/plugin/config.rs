//! Scan Configuration
//!
//! Runtime configuration shared by every plugin in a job. The engine
//! stamps `workspace_id` and `job_id` before dispatch; plugins treat the
//! config as read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Runtime config passed to every plugin of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Primary target (host, URL or IP range)
    pub target: String,
    pub workspace_id: i64,
    /// Stamped by the engine when the job is created
    pub job_id: i64,
    /// Per-invocation timeout in seconds for external tools
    pub timeout: u64,
    /// Concurrency hint for plugins that fan out internally
    pub threads: usize,
    /// Requests per second ceiling for network-heavy plugins
    pub rate_limit: u32,
    /// Optional proxy address, e.g. http://127.0.0.1:8080
    pub proxy: Option<String>,
    pub output_dir: PathBuf,
    /// Plugin-specific parameters keyed by arbitrary names
    pub params: HashMap<String, serde_json::Value>,
}

impl ScanConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Raw plugin-specific parameter lookup
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// String parameter with default
    pub fn param_str(&self, key: &str, default: &str) -> String {
        match self.params.get(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Unsigned integer parameter with default
    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or(default)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.params.insert(key.into(), value);
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            workspace_id: 1,
            job_id: 0,
            timeout: 30,
            threads: 10,
            rate_limit: 100,
            proxy: None,
            output_dir: PathBuf::from("./data/output"),
            params: HashMap::new(),
        }
    }
}

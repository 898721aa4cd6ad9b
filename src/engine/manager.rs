//! Execution Engine
//!
//! Runs one or more plugins against a target per job. Each job gets a
//! supervisor task that resolves plugin ids through the registry, fans
//! out to a bounded worker pool, joins every plugin task regardless of
//! individual outcomes, and finalises the job with the aggregate finding
//! count. Findings stream to the storage collaborator and to observer
//! callbacks as they are produced.

use crate::core::sync::handle_mutex_poison;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::task::{run_plugin_task, TaskContext};
use crate::engine::types::{CancellationToken, DEFAULT_WORKER_CAPACITY};
use crate::notifications::api::{EngineEvent, EventBus};
use crate::plugin::config::ScanConfig;
use crate::plugin::registry::SharedPluginRegistry;
use crate::plugin::types::PluginCategory;
use crate::storage::api::{JobStore, LogLevel};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Plugin execution engine
///
/// Cheap to clone pieces are shared internally, so the engine can be
/// wrapped in an `Arc` and driven from multiple tasks. Multiple jobs run
/// concurrently, each with its own worker pool and cancellation token.
pub struct Engine {
    registry: SharedPluginRegistry,
    store: Arc<dyn JobStore>,
    bus: EventBus,
    active_jobs: Arc<Mutex<HashMap<i64, CancellationToken>>>,
    worker_capacity: usize,
}

impl Engine {
    pub fn new(registry: SharedPluginRegistry, store: Arc<dyn JobStore>) -> Self {
        Self {
            registry,
            store,
            bus: EventBus::new(),
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
            worker_capacity: DEFAULT_WORKER_CAPACITY,
        }
    }

    /// Override the per-job worker pool capacity
    pub fn with_worker_capacity(mut self, capacity: usize) -> Self {
        self.worker_capacity = capacity.max(1);
        self
    }

    /// Register an observer callback; returns the engine for chaining
    pub fn on_event(&self, callback: impl Fn(&EngineEvent) + Send + Sync + 'static) -> &Self {
        self.bus.register(callback);
        self
    }

    /// Number of jobs whose supervisor has not finished yet
    pub fn active_job_count(&self) -> usize {
        self.active_jobs
            .lock()
            .map(|active| active.len())
            .unwrap_or(0)
    }

    /// Dispatch a job
    ///
    /// Creates the job row, stamps the config with workspace and job ids,
    /// registers a cancellation token and launches the supervisor task.
    /// Returns the job id; with `blocking` set the call also waits for
    /// the supervisor to finish.
    pub async fn run(
        &self,
        workspace_id: i64,
        target_id: i64,
        plugin_ids: Vec<String>,
        mut config: ScanConfig,
        blocking: bool,
    ) -> EngineResult<i64> {
        let job_id = self.store.create_job(workspace_id, "mixed", &config).await?;
        config.workspace_id = workspace_id;
        config.job_id = job_id;

        let cancel = CancellationToken::new();
        {
            let mut active =
                handle_mutex_poison(self.active_jobs.lock(), |message| EngineError::Supervisor {
                    message,
                })?;
            active.insert(job_id, cancel.clone());
        }

        let supervisor = JobSupervisor {
            job_id,
            target_id,
            plugin_ids,
            config: Arc::new(config),
            cancel,
            registry: self.registry.clone(),
            store: self.store.clone(),
            bus: self.bus.clone(),
            active_jobs: self.active_jobs.clone(),
            worker_capacity: self.worker_capacity,
        };
        let handle = tokio::spawn(supervisor.supervise());

        if blocking {
            handle.await.map_err(|e| EngineError::Supervisor {
                message: e.to_string(),
            })?;
        }

        Ok(job_id)
    }

    /// Request cancellation of a running job
    ///
    /// Sets the job's cancellation token and immediately marks the job
    /// failed with "Cancelled by user". Fire-and-forget: running plugin
    /// tasks observe the flag cooperatively between findings.
    pub async fn cancel(&self, job_id: i64) {
        let token = match handle_mutex_poison(self.active_jobs.lock(), |message| message) {
            Ok(active) => active.get(&job_id).cloned(),
            Err(message) => {
                log::error!("Failed to read active jobs map: {}", message);
                return;
            }
        };

        match token {
            Some(token) => {
                token.cancel();
                if let Err(e) = self.store.fail_job(job_id, "Cancelled by user").await {
                    log::error!("Failed to mark job {} cancelled: {}", job_id, e);
                }
                log::info!("Cancellation requested for job {}", job_id);
            }
            None => log::debug!("Cancel requested for inactive job {}", job_id),
        }
    }

    /// Run all enabled recon plugins
    pub async fn run_recon(
        &self,
        workspace_id: i64,
        target_id: i64,
        config: ScanConfig,
        blocking: bool,
    ) -> EngineResult<i64> {
        let plugin_ids = self.category_ids(PluginCategory::Recon).await;
        self.run(workspace_id, target_id, plugin_ids, config, blocking)
            .await
    }

    /// Run all enabled scan plugins
    pub async fn run_scan(
        &self,
        workspace_id: i64,
        target_id: i64,
        config: ScanConfig,
        blocking: bool,
    ) -> EngineResult<i64> {
        let plugin_ids = self.category_ids(PluginCategory::Scan).await;
        self.run(workspace_id, target_id, plugin_ids, config, blocking)
            .await
    }

    /// Run a single plugin by id
    pub async fn run_single(
        &self,
        workspace_id: i64,
        target_id: i64,
        plugin_id: &str,
        config: ScanConfig,
        blocking: bool,
    ) -> EngineResult<i64> {
        self.run(
            workspace_id,
            target_id,
            vec![plugin_id.to_string()],
            config,
            blocking,
        )
        .await
    }

    async fn category_ids(&self, category: PluginCategory) -> Vec<String> {
        self.registry
            .by_category(category)
            .await
            .into_iter()
            .map(|descriptor| descriptor.id)
            .collect()
    }
}

/// Owns one job from `running` to its terminal state
struct JobSupervisor {
    job_id: i64,
    target_id: i64,
    plugin_ids: Vec<String>,
    config: Arc<ScanConfig>,
    cancel: CancellationToken,
    registry: SharedPluginRegistry,
    store: Arc<dyn JobStore>,
    bus: EventBus,
    active_jobs: Arc<Mutex<HashMap<i64, CancellationToken>>>,
    worker_capacity: usize,
}

impl JobSupervisor {
    async fn supervise(self) {
        if let Err(e) = self.store.start_job(self.job_id).await {
            log::error!("Failed to mark job {} running: {}", self.job_id, e);
        }
        self.bus.emit(&EngineEvent::JobStart {
            job_id: self.job_id,
            target: self.config.target.clone(),
        });

        // Resolve requested ids; an unknown id is a warning, never fatal
        let mut plugins = Vec::new();
        {
            let registry = self.registry.inner().read().await;
            for plugin_id in &self.plugin_ids {
                match registry.get(plugin_id) {
                    Some(registered) => plugins.push(registered.instantiate()),
                    None => {
                        log::warn!("Plugin not found: {}", plugin_id);
                        self.bus.emit(&EngineEvent::Log {
                            job_id: self.job_id,
                            plugin: plugin_id.clone(),
                            level: LogLevel::Warn,
                            message: format!("Plugin not found: {}", plugin_id),
                        });
                    }
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.worker_capacity));
        let mut handles = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            let semaphore = semaphore.clone();
            let config = self.config.clone();
            let ctx = TaskContext {
                job_id: self.job_id,
                target_id: self.target_id,
                cancel: self.cancel.clone(),
                store: self.store.clone(),
                bus: self.bus.clone(),
            };
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return 0,
                };
                run_plugin_task(plugin, config, ctx).await
            }));
        }

        // Join every task regardless of individual outcomes
        let mut total = 0usize;
        for result in join_all(handles).await {
            match result {
                Ok(count) => total += count,
                Err(e) => {
                    log::error!("Plugin task for job {} failed to join: {}", self.job_id, e)
                }
            }
        }

        if let Err(e) = self.store.finish_job(self.job_id, total).await {
            log::error!("Failed to finalise job {}: {}", self.job_id, e);
            self.bus.emit(&EngineEvent::JobError {
                job_id: self.job_id,
                message: format!("Failed to finalise job: {}", e),
            });
        }
        self.bus.emit(&EngineEvent::JobDone {
            job_id: self.job_id,
            total_findings: total,
        });

        match handle_mutex_poison(self.active_jobs.lock(), |message| message) {
            Ok(mut active) => {
                active.remove(&self.job_id);
            }
            Err(message) => log::error!(
                "Failed to clear job {} from active map: {}",
                self.job_id,
                message
            ),
        }
    }
}

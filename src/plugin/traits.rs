//! Plugin Trait System
//!
//! The capability contract every plugin satisfies, plus the two helpers
//! the engine injects around a run: the `FindingSink` a plugin streams
//! results into, and the `PluginLogger` that routes log calls to both the
//! durable log store and the live event stream.
//!
//! # Plugin Architecture
//!
//! A plugin is an independently implemented unit of work that, given a
//! config, streams `Finding`s. Plugins typically drive long-running
//! external processes, so results must be produced incrementally rather
//! than buffered; the engine persists and broadcasts each finding as it
//! arrives. A fresh plugin instance is created per job through its
//! registered factory.

use crate::engine::types::CancellationToken;
use crate::notifications::api::{EngineEvent, EventBus};
use crate::plugin::config::ScanConfig;
use crate::plugin::error::PluginResult;
use crate::plugin::findings::Finding;
use crate::plugin::types::PluginDescriptor;
use crate::storage::api::{JobStore, LogLevel};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Base trait all plugins must implement
///
/// Any type supplying a descriptor, a validation hook and a streaming
/// `run` is a valid plugin variant; there is no base class to inherit.
#[async_trait::async_trait]
pub trait ScanPlugin: Send + Sync {
    /// Plugin metadata; `descriptor().id` must be non-empty and unique
    fn descriptor(&self) -> PluginDescriptor;

    /// Shorthand for the descriptor id
    fn id(&self) -> String {
        self.descriptor().id
    }

    /// Inject the logging hook
    ///
    /// Called by the engine before `run`. Plugins store the logger and
    /// use it for all job-scoped logging.
    fn set_logger(&mut self, logger: PluginLogger);

    /// Validate the job config before running
    ///
    /// A `Some(reason)` aborts only this plugin's task: the engine logs
    /// an error and the plugin contributes zero findings. Sibling plugins
    /// are unaffected.
    fn validate_config(&self, _config: &ScanConfig) -> Option<String> {
        None
    }

    /// Execute the plugin, streaming findings into the sink
    ///
    /// Implementations must emit findings as they are discovered and stop
    /// producing once `FindingSink::emit` returns false (job cancelled or
    /// the engine stopped consuming); cancellation is not an error. The
    /// sink is consumed by this one invocation and cannot be reused.
    async fn run(&mut self, config: Arc<ScanConfig>, sink: FindingSink) -> PluginResult<()>;
}

/// Bounded channel endpoint a plugin streams findings into
///
/// Wraps the producer half of the per-task channel together with the
/// job's cancellation token so plugins can check for a requested stop
/// between items.
pub struct FindingSink {
    tx: mpsc::Sender<Finding>,
    cancel: CancellationToken,
}

impl FindingSink {
    pub(crate) fn new(tx: mpsc::Sender<Finding>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Emit one finding
    ///
    /// Returns false when the job has been cancelled or the engine is no
    /// longer consuming; the plugin should stop producing and return
    /// `Ok(())`.
    pub async fn emit(&self, finding: Finding) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(finding).await.is_ok()
    }

    /// Check the job's cancellation flag without emitting
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Job-scoped logging hook injected into plugins by the engine
///
/// Every call is appended to the durable log store, broadcast as a `Log`
/// event, and mirrored to the process logger. Storage failures are logged
/// and swallowed so a broken store never takes a plugin down.
#[derive(Clone)]
pub struct PluginLogger {
    job_id: i64,
    plugin_id: String,
    store: Arc<dyn JobStore>,
    bus: EventBus,
}

impl PluginLogger {
    pub(crate) fn new(
        job_id: i64,
        plugin_id: impl Into<String>,
        store: Arc<dyn JobStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            job_id,
            plugin_id: plugin_id.into(),
            store,
            bus,
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub async fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        data: HashMap<String, serde_json::Value>,
    ) {
        let message = message.into();

        log::log!(
            level.as_log_level(),
            "[job {}][{}] {}",
            self.job_id,
            self.plugin_id,
            message
        );

        if let Err(e) = self
            .store
            .append_log(self.job_id, &self.plugin_id, &message, level, data)
            .await
        {
            log::error!(
                "Failed to persist log entry for job {}: {}",
                self.job_id,
                e
            );
        }

        self.bus.emit(&EngineEvent::Log {
            job_id: self.job_id,
            plugin: self.plugin_id.clone(),
            level,
            message,
        });
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, HashMap::new()).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, HashMap::new()).await;
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, HashMap::new()).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, HashMap::new()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::findings::FindingKind;
    use crate::plugin::types::PluginCategory;
    use crate::storage::api::MemoryStore;

    // Minimal plugin for exercising the trait surface
    struct MockPlugin {
        logger: Option<PluginLogger>,
        reject_config: bool,
    }

    impl MockPlugin {
        fn new(reject_config: bool) -> Self {
            Self {
                logger: None,
                reject_config,
            }
        }
    }

    #[async_trait::async_trait]
    impl ScanPlugin for MockPlugin {
        fn descriptor(&self) -> PluginDescriptor {
            PluginDescriptor::new("test.mock", "Mock", PluginCategory::Util)
        }

        fn set_logger(&mut self, logger: PluginLogger) {
            self.logger = Some(logger);
        }

        fn validate_config(&self, config: &ScanConfig) -> Option<String> {
            if self.reject_config || config.target.is_empty() {
                Some("target must not be empty".to_string())
            } else {
                None
            }
        }

        async fn run(&mut self, _config: Arc<ScanConfig>, sink: FindingSink) -> PluginResult<()> {
            sink.emit(Finding::new(FindingKind::Info, "mock-result", self.id()))
                .await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_id_comes_from_descriptor() {
        let plugin = MockPlugin::new(false);
        assert_eq!(plugin.id(), "test.mock");
    }

    #[tokio::test]
    async fn test_validate_config_rejects() {
        let plugin = MockPlugin::new(true);
        let config = ScanConfig::new("example.com");
        assert!(plugin.validate_config(&config).is_some());

        let plugin = MockPlugin::new(false);
        assert!(plugin.validate_config(&config).is_none());
        assert!(plugin.validate_config(&ScanConfig::default()).is_some());
    }

    #[tokio::test]
    async fn test_sink_emit_delivers_finding() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = FindingSink::new(tx, CancellationToken::new());

        let mut plugin = MockPlugin::new(false);
        plugin
            .run(Arc::new(ScanConfig::new("example.com")), sink)
            .await
            .unwrap();

        let finding = rx.recv().await.expect("finding should be delivered");
        assert_eq!(finding.value, "mock-result");
        assert_eq!(finding.source, "test.mock");
    }

    #[tokio::test]
    async fn test_sink_emit_refuses_after_cancel() {
        let (tx, _rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let sink = FindingSink::new(tx, cancel.clone());

        cancel.cancel();
        assert!(sink.is_cancelled());
        let delivered = sink
            .emit(Finding::new(FindingKind::Info, "late", "test.mock"))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_sink_emit_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sink = FindingSink::new(tx, CancellationToken::new());
        drop(rx);

        let delivered = sink
            .emit(Finding::new(FindingKind::Info, "orphan", "test.mock"))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_logger_routes_to_store_and_bus() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        bus.register(move |event| {
            if let EngineEvent::Log { message, level, .. } = event {
                seen_clone.lock().unwrap().push((*level, message.clone()));
            }
        });

        let logger = PluginLogger::new(9, "test.mock", store.clone(), bus);
        logger.warn("slow response").await;
        logger.error("probe failed").await;

        let logs = store.logs_for_job(9);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, LogLevel::Warn);
        assert_eq!(logs[0].message, "slow response");
        assert_eq!(logs[1].level, LogLevel::Error);

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (LogLevel::Warn, "slow response".to_string()));
    }
}

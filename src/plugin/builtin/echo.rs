//! Echo Plugin
//!
//! Emits one informational finding per configured value, or the target
//! itself when none are configured. Exists to exercise the full
//! dispatch/persist/broadcast pipeline without external tools.

use crate::builtin_plugin;
use crate::plugin::config::ScanConfig;
use crate::plugin::error::PluginResult;
use crate::plugin::findings::{Finding, FindingKind};
use crate::plugin::traits::{FindingSink, PluginLogger, ScanPlugin};
use crate::plugin::types::{PluginCategory, PluginDescriptor};
use std::sync::Arc;

pub struct EchoPlugin {
    logger: Option<PluginLogger>,
}

impl EchoPlugin {
    pub fn new() -> Self {
        Self { logger: None }
    }
}

impl Default for EchoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScanPlugin for EchoPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("util.echo", "Echo", PluginCategory::Util)
            .with_description("Emits configured values as informational findings")
            .with_tags(vec!["diagnostic".to_string()])
    }

    fn set_logger(&mut self, logger: PluginLogger) {
        self.logger = Some(logger);
    }

    fn validate_config(&self, config: &ScanConfig) -> Option<String> {
        if config.target.trim().is_empty() {
            Some("target must not be empty".to_string())
        } else {
            None
        }
    }

    async fn run(&mut self, config: Arc<ScanConfig>, sink: FindingSink) -> PluginResult<()> {
        let values: Vec<String> = match config.param("values") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![config.target.clone()],
        };

        if let Some(logger) = &self.logger {
            logger.info(format!("Echoing {} values", values.len())).await;
        }

        for value in values {
            if sink.is_cancelled() {
                break;
            }
            let finding = Finding::new(FindingKind::Info, &value, self.id())
                .with_title(format!("Echo: {}", value));
            if !sink.emit(finding).await {
                break;
            }
        }

        Ok(())
    }
}

builtin_plugin!(EchoPlugin);

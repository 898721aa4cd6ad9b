//! Per-plugin task execution
//!
//! One task per resolved plugin: inject the logger, validate the config,
//! then consume the plugin's finding stream item by item, persisting and
//! broadcasting each one. Failures stay inside the task; the returned
//! count is whatever was processed before the plugin finished or died.

use crate::engine::types::CancellationToken;
use crate::notifications::api::{EngineEvent, EventBus};
use crate::plugin::config::ScanConfig;
use crate::plugin::findings::{Finding, FindingKind};
use crate::plugin::traits::{FindingSink, PluginLogger, ScanPlugin};
use crate::storage::api::{JobStore, LogLevel};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Bound on the producer/consumer channel between a plugin and its task
pub(crate) const FINDING_CHANNEL_CAPACITY: usize = 64;

/// Everything a plugin task needs from its job
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub job_id: i64,
    pub target_id: i64,
    pub cancel: CancellationToken,
    pub store: Arc<dyn JobStore>,
    pub bus: EventBus,
}

/// Run one plugin to completion, returning its contributed finding count
pub(crate) async fn run_plugin_task(
    mut plugin: Box<dyn ScanPlugin>,
    config: Arc<ScanConfig>,
    ctx: TaskContext,
) -> usize {
    let plugin_id = plugin.id();
    let logger = PluginLogger::new(
        ctx.job_id,
        plugin_id.clone(),
        ctx.store.clone(),
        ctx.bus.clone(),
    );
    plugin.set_logger(logger.clone());

    if let Some(reason) = plugin.validate_config(&config) {
        logger.error(format!("Config invalid: {}", reason)).await;
        ctx.bus.emit(&EngineEvent::PluginDone {
            job_id: ctx.job_id,
            plugin: plugin_id,
            findings: 0,
        });
        return 0;
    }

    ctx.bus.emit(&EngineEvent::PluginStart {
        job_id: ctx.job_id,
        plugin: plugin_id.clone(),
    });

    let (tx, mut rx) = mpsc::channel(FINDING_CHANNEL_CAPACITY);
    let sink = FindingSink::new(tx, ctx.cancel.clone());
    let producer = tokio::spawn(async move { plugin.run(config, sink).await });

    let mut count = 0usize;
    let mut last_asset_id: Option<i64> = None;
    let mut cancel_logged = false;

    while let Some(finding) = rx.recv().await {
        if ctx.cancel.is_cancelled() {
            logger.warn("Job cancelled").await;
            cancel_logged = true;
            break;
        }

        count += 1;
        persist_finding(&finding, &ctx, &mut last_asset_id).await;

        ctx.bus.emit(&EngineEvent::Finding {
            job_id: ctx.job_id,
            plugin: plugin_id.clone(),
            finding,
        });
    }
    // Closing the receiver makes any in-flight emit fail, which tells the
    // plugin to stop producing
    drop(rx);

    // The producer may have observed the flag first and closed the channel
    // before the consumer saw another item
    if !cancel_logged && ctx.cancel.is_cancelled() {
        logger.warn("Job cancelled").await;
    }

    match producer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let data = HashMap::from([(
                "error".to_string(),
                serde_json::json!(format!("{:?}", e)),
            )]);
            logger
                .log(LogLevel::Error, format!("Runtime error: {}", e), data)
                .await;
        }
        Err(join_err) => {
            let detail = if join_err.is_panic() {
                let payload = join_err.into_panic();
                if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "plugin panicked".to_string()
                }
            } else {
                join_err.to_string()
            };
            let data = HashMap::from([("panic".to_string(), serde_json::json!(detail))]);
            logger
                .log(LogLevel::Error, format!("Runtime error: {}", detail), data)
                .await;
        }
    }

    ctx.bus.emit(&EngineEvent::PluginDone {
        job_id: ctx.job_id,
        plugin: plugin_id,
        findings: count,
    });

    count
}

/// Translate a finding into its durable entity
///
/// Assets and vulnerabilities are persisted; a vulnerability links to the
/// last asset created within the same plugin task. Info and chain-step
/// findings are broadcast only. Storage failures are logged as
/// engine-level errors and the stream continues.
async fn persist_finding(
    finding: &Finding,
    ctx: &TaskContext,
    last_asset_id: &mut Option<i64>,
) {
    match finding.kind {
        FindingKind::Asset => {
            match ctx
                .store
                .add_asset(
                    ctx.target_id,
                    &finding.asset_type(),
                    &finding.value,
                    &finding.source,
                    &finding.metadata,
                )
                .await
            {
                Ok(asset_id) => *last_asset_id = Some(asset_id),
                Err(e) => log::error!(
                    "Failed to persist asset finding for job {}: {}",
                    ctx.job_id,
                    e
                ),
            }
        }
        FindingKind::Vuln => {
            if let Err(e) = ctx
                .store
                .add_vulnerability(
                    ctx.target_id,
                    &finding.source,
                    finding.display_name(),
                    finding.severity,
                    &finding.description,
                    &finding.evidence,
                    finding.cve.as_deref(),
                    finding.cvss,
                    *last_asset_id,
                )
                .await
            {
                log::error!(
                    "Failed to persist vulnerability for job {}: {}",
                    ctx.job_id,
                    e
                );
            }
        }
        FindingKind::Info | FindingKind::ChainStep => {}
    }
}

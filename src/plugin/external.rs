//! External Tool Plugins
//!
//! Manifest-driven plugins wrapping external command-line tools. A TOML
//! manifest describes the descriptor and the command template; the
//! resulting plugin spawns the tool, streams one finding per stdout line
//! and applies its own per-invocation timeout.

use crate::plugin::config::ScanConfig;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::findings::{Finding, FindingKind, Severity};
use crate::plugin::traits::{FindingSink, PluginLogger, ScanPlugin};
use crate::plugin::types::{PluginCategory, PluginDescriptor};
use regex::Regex;
use serde::Deserialize;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Parsed plugin manifest: descriptor metadata plus the command template
#[derive(Debug, Clone, Deserialize)]
pub struct ToolManifest {
    pub plugin: ManifestPlugin,
    pub command: ManifestCommand,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPlugin {
    pub id: String,
    pub name: String,
    pub category: PluginCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestCommand {
    pub program: String,
    /// Arguments with `{target}`, `{timeout}` and `{proxy}` placeholders
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra arguments appended only when the config carries a proxy
    #[serde(default)]
    pub proxy_args: Vec<String>,
    /// Per-invocation timeout in seconds; falls back to the config value
    pub timeout: Option<u64>,
    #[serde(default = "default_finding_kind")]
    pub finding_kind: FindingKind,
    /// Asset classification stamped on asset findings
    pub asset_type: Option<String>,
    pub severity: Option<Severity>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_finding_kind() -> FindingKind {
    FindingKind::Asset
}

impl ToolManifest {
    pub fn parse(raw: &str) -> PluginResult<Self> {
        let manifest: ToolManifest =
            toml::from_str(raw).map_err(|e| PluginError::Generic {
                message: format!("manifest parse error: {}", e),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> PluginResult<()> {
        if self.plugin.id.is_empty() {
            return Err(PluginError::InvalidDescriptor {
                message: "plugin id must not be empty".to_string(),
            });
        }
        if self.command.program.is_empty() {
            return Err(PluginError::InvalidDescriptor {
                message: format!("plugin '{}' has no command program", self.plugin.id),
            });
        }
        Ok(())
    }

    pub fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor {
            id: self.plugin.id.clone(),
            name: self.plugin.name.clone(),
            category: self.plugin.category,
            description: self.plugin.description.clone(),
            tags: self.plugin.tags.clone(),
            author: self.plugin.author.clone(),
            version: self.plugin.version.clone(),
            requires: self.plugin.requires.clone(),
            enabled: self.plugin.enabled,
        }
    }
}

/// Reduce a target to its bare host: strip scheme, path and trailing slash
fn normalize_target(target: &str) -> String {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    let scheme = SCHEME
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("static pattern"));

    scheme
        .replace(target.trim(), "")
        .trim_end_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn substitute(template: &str, target: &str, proxy: &str, timeout: u64) -> String {
    template
        .replace("{target}", target)
        .replace("{timeout}", &timeout.to_string())
        .replace("{proxy}", proxy)
}

/// Plugin that runs an external tool described by a manifest
pub struct CommandPlugin {
    manifest: Arc<ToolManifest>,
    logger: Option<PluginLogger>,
}

impl CommandPlugin {
    pub fn new(manifest: Arc<ToolManifest>) -> Self {
        Self {
            manifest,
            logger: None,
        }
    }

    async fn log_info(&self, message: String) {
        if let Some(logger) = &self.logger {
            logger.info(message).await;
        }
    }

    async fn log_warn(&self, message: String) {
        if let Some(logger) = &self.logger {
            logger.warn(message).await;
        }
    }

    async fn log_error(&self, message: String) {
        if let Some(logger) = &self.logger {
            logger.error(message).await;
        }
    }

    fn finding_for_line(&self, line: &str) -> Finding {
        let spec = &self.manifest.command;
        let mut finding = Finding::new(spec.finding_kind, line, &self.manifest.plugin.id)
            .with_severity(spec.severity.unwrap_or_default())
            .with_metadata_entry("tool", serde_json::json!(spec.program));

        if spec.finding_kind == FindingKind::Asset {
            let asset_type = spec.asset_type.as_deref().unwrap_or("url");
            finding = finding
                .with_title(format!("{}: {}", asset_type, line))
                .with_metadata_entry("asset_type", serde_json::json!(asset_type));
        }
        finding
    }
}

#[async_trait::async_trait]
impl ScanPlugin for CommandPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.manifest.descriptor()
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
        let spec = &self.manifest.command;
        let plugin_id = self.manifest.plugin.id.clone();

        let target = normalize_target(&config.target);
        if target.is_empty() {
            return Err(PluginError::ExecutionError {
                plugin_id,
                cause: format!("no usable host in target '{}'", config.target),
            });
        }

        let timeout_secs = spec.timeout.unwrap_or(config.timeout);
        let proxy = config.proxy.clone().unwrap_or_default();

        let mut args: Vec<String> = spec
            .args
            .iter()
            .map(|arg| substitute(arg, &target, &proxy, timeout_secs))
            .collect();
        if config.proxy.is_some() {
            args.extend(
                spec.proxy_args
                    .iter()
                    .map(|arg| substitute(arg, &target, &proxy, timeout_secs)),
            );
        }

        self.log_info(format!("Running {} against {}", spec.program, target))
            .await;

        let mut child = match Command::new(&spec.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.log_warn(format!("{} is not installed, skipping", spec.program))
                    .await;
                return Ok(());
            }
            Err(e) => {
                return Err(PluginError::ExecutionError {
                    plugin_id,
                    cause: format!("failed to spawn {}: {}", spec.program, e),
                });
            }
        };

        let stdout = child.stdout.take().ok_or_else(|| PluginError::ExecutionError {
            plugin_id: plugin_id.clone(),
            cause: "stdout was not captured".to_string(),
        })?;
        let mut lines = BufReader::new(stdout).lines();

        let stream = async {
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if sink.is_cancelled() {
                    break;
                }
                if !sink.emit(self.finding_for_line(line)).await {
                    break;
                }
            }
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), stream).await {
            Ok(()) => {
                if sink.is_cancelled() {
                    let _ = child.kill().await;
                } else if let Ok(status) = child.wait().await {
                    if !status.success() {
                        self.log_warn(format!("{} exited with {}", spec.program, status))
                            .await;
                    }
                }
                Ok(())
            }
            Err(_) => {
                let _ = child.kill().await;
                self.log_error(format!(
                    "{} timed out after {}s",
                    spec.program, timeout_secs
                ))
                .await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::CancellationToken;

    const ECHO_MANIFEST: &str = r#"
[plugin]
id = "recon.echo-tool"
name = "Echo Tool"
category = "recon"
description = "Echoes the target back"
tags = ["test"]

[command]
program = "echo"
args = ["{target}"]
asset_type = "host"
"#;

    #[test]
    fn test_manifest_parse_defaults() {
        let manifest = ToolManifest::parse(ECHO_MANIFEST).unwrap();
        assert_eq!(manifest.plugin.id, "recon.echo-tool");
        assert_eq!(manifest.plugin.category, PluginCategory::Recon);
        assert_eq!(manifest.plugin.version, "1.0.0");
        assert!(manifest.plugin.enabled);
        assert_eq!(manifest.command.finding_kind, FindingKind::Asset);
        assert_eq!(manifest.command.asset_type.as_deref(), Some("host"));
        assert!(manifest.command.timeout.is_none());
    }

    #[test]
    fn test_manifest_rejects_missing_id() {
        let raw = r#"
[plugin]
id = ""
name = "Broken"
category = "util"

[command]
program = "true"
"#;
        assert!(ToolManifest::parse(raw).is_err());
    }

    #[test]
    fn test_manifest_rejects_garbage() {
        assert!(ToolManifest::parse("this is not toml at all [").is_err());
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("https://example.com/path"), "example.com");
        assert_eq!(normalize_target("http://example.com/"), "example.com");
        assert_eq!(normalize_target("example.com"), "example.com");
        assert_eq!(normalize_target("  10.0.0.1  "), "10.0.0.1");
        assert_eq!(normalize_target("https://"), "");
    }

    #[test]
    fn test_substitute_placeholders() {
        let result = substitute("-d {target} -t {timeout}", "example.com", "", 60);
        assert_eq!(result, "-d example.com -t 60");

        let result = substitute("-x {proxy}", "t", "http://127.0.0.1:8080", 30);
        assert_eq!(result, "-x http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_run_streams_stdout_lines() {
        let manifest = Arc::new(ToolManifest::parse(ECHO_MANIFEST).unwrap());
        let mut plugin = CommandPlugin::new(manifest);

        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let sink = FindingSink::new(tx, CancellationToken::new());
        let config = Arc::new(ScanConfig::new("https://example.com/ignored/path"));

        plugin.run(config, sink).await.unwrap();

        let finding = rx.recv().await.expect("echo output should arrive");
        assert_eq!(finding.value, "example.com");
        assert_eq!(finding.kind, FindingKind::Asset);
        assert_eq!(finding.source, "recon.echo-tool");
        assert_eq!(finding.asset_type(), "host");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_degrades_to_noop() {
        let raw = r#"
[plugin]
id = "recon.ghost"
name = "Ghost"
category = "recon"

[command]
program = "scanforge-no-such-binary-a8f2"
args = ["{target}"]
"#;
        let manifest = Arc::new(ToolManifest::parse(raw).unwrap());
        let mut plugin = CommandPlugin::new(manifest);

        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let sink = FindingSink::new(tx, CancellationToken::new());

        // Missing binary is a warning, not an error
        let result = plugin.run(Arc::new(ScanConfig::new("example.com")), sink).await;
        assert!(result.is_ok());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unusable_target_is_an_error() {
        let manifest = Arc::new(ToolManifest::parse(ECHO_MANIFEST).unwrap());
        let mut plugin = CommandPlugin::new(manifest);

        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let sink = FindingSink::new(tx, CancellationToken::new());

        let result = plugin.run(Arc::new(ScanConfig::new("https://")), sink).await;
        assert!(matches!(
            result,
            Err(PluginError::ExecutionError { .. })
        ));
    }
}

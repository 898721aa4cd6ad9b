//! Finding Model
//!
//! A Finding is a single discovered result streamed from a plugin to the
//! engine: an asset, a vulnerability, an informational item or an attack
//! chain step. Findings are immutable after creation and consumed exactly
//! once by the engine for persistence and event emission.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use strum_macros::{Display, EnumString};

/// Classification of a finding, drives how the engine persists it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Discovered asset (subdomain, URL, service, endpoint)
    Asset,
    /// Vulnerability, optionally linked to an asset
    Vuln,
    /// Informational result, broadcast only, never persisted as an entity
    Info,
    /// Step in an attack chain, broadcast only
    ChainStep,
}

/// Severity scale for findings and vulnerabilities
///
/// Variants are declared lowest-first so the derived `Ord` ranks
/// `Critical` highest; listings sort descending to get the
/// critical > high > medium > low > info precedence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

/// A single result emitted by a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Primary payload (URL, hash, subdomain, ...)
    pub value: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Structured proof material (request, response, payload, ...)
    pub evidence: HashMap<String, serde_json::Value>,
    pub cve: Option<String>,
    pub cvss: Option<f64>,
    /// Free-form per-tool metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// Id of the plugin that produced this finding
    pub source: String,
    pub ts: SystemTime,
}

impl Finding {
    pub fn new(kind: FindingKind, value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            severity: Severity::default(),
            title: String::new(),
            description: String::new(),
            evidence: HashMap::new(),
            cve: None,
            cvss: None,
            metadata: HashMap::new(),
            source: source.into(),
            ts: SystemTime::now(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cve(mut self, cve: impl Into<String>) -> Self {
        self.cve = Some(cve.into());
        self
    }

    pub fn with_cvss(mut self, cvss: f64) -> Self {
        self.cvss = Some(cvss);
        self
    }

    pub fn with_evidence_entry(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.evidence.insert(key.into(), value);
        self
    }

    pub fn with_metadata_entry(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Asset classification taken from the `asset_type` metadata key,
    /// falling back to "url" when a tool did not set one
    pub fn asset_type(&self) -> String {
        self.metadata
            .get("asset_type")
            .and_then(|v| v.as_str())
            .unwrap_or("url")
            .to_string()
    }

    /// Display name for vulnerability persistence: the title when set,
    /// otherwise the raw value
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.value
        } else {
            &self.title
        }
    }
}

/// Sort findings by severity, most severe first
///
/// The sort is stable so findings of equal severity keep their insertion
/// order.
pub fn sort_by_severity(findings: &mut [Finding]) {
    findings.sort_by_key(|f| std::cmp::Reverse(f.severity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_precedence() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn test_severity_string_round_trip() {
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!(Severity::from_str("high").unwrap(), Severity::High);
        assert!(Severity::from_str("catastrophic").is_err());
    }

    #[test]
    fn test_finding_kind_strings() {
        assert_eq!(FindingKind::ChainStep.to_string(), "chain_step");
        assert_eq!(FindingKind::from_str("vuln").unwrap(), FindingKind::Vuln);
    }

    #[test]
    fn test_finding_builder() {
        let finding = Finding::new(FindingKind::Vuln, "http://example.com/admin", "scan.nuclei")
            .with_severity(Severity::High)
            .with_title("Exposed admin panel")
            .with_cve("CVE-2024-1234")
            .with_cvss(8.1)
            .with_evidence_entry("status_code", serde_json::json!(200));

        assert_eq!(finding.kind, FindingKind::Vuln);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.source, "scan.nuclei");
        assert_eq!(finding.cve.as_deref(), Some("CVE-2024-1234"));
        assert_eq!(finding.cvss, Some(8.1));
        assert_eq!(
            finding.evidence.get("status_code"),
            Some(&serde_json::json!(200))
        );
    }

    #[test]
    fn test_asset_type_defaults_to_url() {
        let finding = Finding::new(FindingKind::Asset, "sub.example.com", "recon.subfinder");
        assert_eq!(finding.asset_type(), "url");

        let finding = finding.with_metadata_entry("asset_type", serde_json::json!("subdomain"));
        assert_eq!(finding.asset_type(), "subdomain");
    }

    #[test]
    fn test_display_name_falls_back_to_value() {
        let finding = Finding::new(FindingKind::Vuln, "sqli at /login", "scan.sqlmap");
        assert_eq!(finding.display_name(), "sqli at /login");

        let finding = finding.with_title("SQL injection");
        assert_eq!(finding.display_name(), "SQL injection");
    }

    #[test]
    fn test_sort_by_severity_is_stable() {
        let mut findings = vec![
            Finding::new(FindingKind::Vuln, "low-1", "a").with_severity(Severity::Low),
            Finding::new(FindingKind::Vuln, "crit-1", "a").with_severity(Severity::Critical),
            Finding::new(FindingKind::Vuln, "low-2", "a").with_severity(Severity::Low),
            Finding::new(FindingKind::Vuln, "high-1", "a").with_severity(Severity::High),
        ];

        sort_by_severity(&mut findings);

        let order: Vec<&str> = findings.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(order, vec!["crit-1", "high-1", "low-1", "low-2"]);
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding::new(FindingKind::ChainStep, "pivot", "post.chain");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "chain_step");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["source"], "post.chain");
    }
}

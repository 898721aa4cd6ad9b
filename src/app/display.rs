//! Console rendering for the CLI
//!
//! Plugin listing table, live event lines and the end-of-job summary.

use crate::notifications::api::EngineEvent;
use crate::plugin::api::{PluginDescriptor, Severity};
use crate::storage::api::{LogLevel, MemoryStore};
use colored::Colorize;
use prettytable::{row, Table};

/// Render descriptors as a listing table, sorted by id
pub fn plugin_table(descriptors: &[PluginDescriptor]) -> Table {
    let mut sorted: Vec<&PluginDescriptor> = descriptors.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut table = Table::new();
    table.add_row(row!["ID", "NAME", "CATEGORY", "VERSION", "ENABLED", "DESCRIPTION"]);
    for descriptor in sorted {
        table.add_row(row![
            descriptor.id,
            descriptor.name,
            descriptor.category.to_string(),
            descriptor.version,
            descriptor.enabled,
            descriptor.description
        ]);
    }
    table
}

fn severity_label(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.blue().to_string(),
        Severity::Info => label.dimmed().to_string(),
    }
}

fn log_label(level: LogLevel) -> String {
    let label = level.to_string();
    match level {
        LogLevel::Error => label.red().to_string(),
        LogLevel::Warn => label.yellow().to_string(),
        LogLevel::Info => label.green().to_string(),
        LogLevel::Debug => label.blue().to_string(),
    }
}

/// Print one live event line
pub fn print_event(event: &EngineEvent) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    match event {
        EngineEvent::JobStart { job_id, target } => {
            println!("{} {} job {} against {}", stamp, "start".cyan(), job_id, target);
        }
        EngineEvent::JobDone {
            job_id,
            total_findings,
        } => {
            println!(
                "{} {} job {} with {} findings",
                stamp,
                "done".green(),
                job_id,
                total_findings
            );
        }
        EngineEvent::JobError { job_id, message } => {
            println!("{} {} job {}: {}", stamp, "error".red(), job_id, message);
        }
        EngineEvent::PluginStart { plugin, .. } => {
            println!("{}   {} {}", stamp, "run".cyan(), plugin);
        }
        EngineEvent::PluginDone {
            plugin, findings, ..
        } => {
            println!("{}   {} {} ({} findings)", stamp, "end".green(), plugin, findings);
        }
        EngineEvent::Finding { finding, .. } => {
            println!(
                "{}     {} [{}] {}",
                stamp,
                "+".green(),
                severity_label(finding.severity),
                finding.value
            );
        }
        EngineEvent::Log {
            plugin,
            level,
            message,
            ..
        } => {
            println!("{}     {} {}: {}", stamp, log_label(*level), plugin, message);
        }
    }
}

/// Print the end-of-job summary from the store
pub fn print_summary(store: &MemoryStore, job_id: i64, target_id: i64) {
    let Some(job) = store.job(job_id) else {
        println!("No record for job {}", job_id);
        return;
    };

    println!();
    println!(
        "Job {} finished with status '{}' and {} findings",
        job.id, job.status, job.result_count
    );
    if let Some(error) = &job.error {
        println!("  error: {}", error.red());
    }

    let assets = store.assets_for_target(target_id);
    if !assets.is_empty() {
        println!("  {} assets discovered", assets.len());
    }

    let vulns = store.vulns_by_severity(target_id);
    if !vulns.is_empty() {
        println!("  {} vulnerabilities:", vulns.len());
        for vuln in vulns {
            println!(
                "    [{}] {} ({})",
                severity_label(vuln.severity),
                vuln.name,
                vuln.plugin_id
            );
        }
    }
}

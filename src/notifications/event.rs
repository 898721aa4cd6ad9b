//! Engine event types
//!
//! One tagged union covering the whole job lifecycle. Every variant is a
//! serialisable snapshot so observers can forward events to a UI or wire
//! format without touching engine internals.

use crate::plugin::findings::Finding;
use crate::storage::types::LogLevel;
use serde::Serialize;
use strum_macros::Display;

/// Discriminant of an `EngineEvent`, handy for observer-side filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    JobStart,
    JobDone,
    JobError,
    PluginStart,
    PluginDone,
    Finding,
    Log,
}

/// Events broadcast by the execution engine
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    JobStart {
        job_id: i64,
        target: String,
    },
    JobDone {
        job_id: i64,
        total_findings: usize,
    },
    JobError {
        job_id: i64,
        message: String,
    },
    PluginStart {
        job_id: i64,
        plugin: String,
    },
    PluginDone {
        job_id: i64,
        plugin: String,
        findings: usize,
    },
    Finding {
        job_id: i64,
        plugin: String,
        finding: Finding,
    },
    Log {
        job_id: i64,
        plugin: String,
        level: LogLevel,
        message: String,
    },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::JobStart { .. } => EventKind::JobStart,
            EngineEvent::JobDone { .. } => EventKind::JobDone,
            EngineEvent::JobError { .. } => EventKind::JobError,
            EngineEvent::PluginStart { .. } => EventKind::PluginStart,
            EngineEvent::PluginDone { .. } => EventKind::PluginDone,
            EngineEvent::Finding { .. } => EventKind::Finding,
            EngineEvent::Log { .. } => EventKind::Log,
        }
    }

    /// Job the event belongs to
    pub fn job_id(&self) -> i64 {
        match self {
            EngineEvent::JobStart { job_id, .. }
            | EngineEvent::JobDone { job_id, .. }
            | EngineEvent::JobError { job_id, .. }
            | EngineEvent::PluginStart { job_id, .. }
            | EngineEvent::PluginDone { job_id, .. }
            | EngineEvent::Finding { job_id, .. }
            | EngineEvent::Log { job_id, .. } => *job_id,
        }
    }
}

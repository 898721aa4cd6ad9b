//! Scanforge - plugin-driven security tool orchestration
//!
//! The crate is organised around four subsystems: the plugin capability
//! contract and registry (`plugin`), the job execution engine (`engine`),
//! the event broadcasting layer (`notifications`) and the storage
//! collaborator interface (`storage`). The `app` module is the thin CLI
//! front door and `core` holds shared utilities.

pub mod app;
pub mod core;
pub mod engine;
pub mod notifications;
pub mod plugin;
pub mod storage;

//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::notifications::event::{EngineEvent, EventKind};
pub use crate::notifications::manager::{EventBus, EventCallback};

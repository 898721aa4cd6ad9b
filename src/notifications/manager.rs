//! EventBus implementation
//!
//! Fan-out of engine events to observer callbacks. A failing callback is
//! caught and discarded; it never aborts the emitting task or blocks
//! delivery to the remaining callbacks.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::notifications::event::EngineEvent;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

/// Observer callback invoked synchronously for every event
pub type EventCallback = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Shared, clonable event fan-out
#[derive(Clone, Default)]
pub struct EventBus {
    callbacks: Arc<RwLock<Vec<EventCallback>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer callback
    pub fn register(&self, callback: impl Fn(&EngineEvent) + Send + Sync + 'static) {
        match handle_rwlock_write(self.callbacks.write(), |message| message) {
            Ok(mut callbacks) => callbacks.push(Arc::new(callback)),
            Err(message) => log::error!("Failed to register event callback: {}", message),
        }
    }

    pub fn callback_count(&self) -> usize {
        handle_rwlock_read(self.callbacks.read(), |message| message)
            .map(|callbacks| callbacks.len())
            .unwrap_or(0)
    }

    /// Deliver an event to every registered callback
    ///
    /// Panicking callbacks are isolated per delivery; the panic is
    /// swallowed and the remaining callbacks still run.
    pub fn emit(&self, event: &EngineEvent) {
        let callbacks = match handle_rwlock_read(self.callbacks.read(), |message| message) {
            Ok(callbacks) => callbacks,
            Err(message) => {
                log::error!("Failed to deliver {} event: {}", event.kind(), message);
                return;
            }
        };

        for callback in callbacks.iter() {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                log::debug!("Observer callback panicked on {} event, discarded", event.kind());
            }
        }
    }
}

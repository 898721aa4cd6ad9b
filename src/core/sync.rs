//! Synchronization utilities for robust lock handling
//!
//! Converts lock poisoning into application-specific errors so callers do
//! not have to repeat the same recovery boilerplate at every lock site.

use std::sync::{LockResult, RwLockReadGuard, RwLockWriteGuard};

/// Handle poisoned mutex cases with consistent error handling
///
/// A poisoned mutex means a panic occurred while the lock was held. The
/// provided constructor turns that condition into the caller's own error
/// type instead of propagating the raw `PoisonError`.
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). A panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Handle poisoned RwLock read operations with consistent error handling
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock read poisoned). A panic occurred while holding a write lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Handle poisoned RwLock write operations with consistent error handling
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock write poisoned). A panic occurred while holding the lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

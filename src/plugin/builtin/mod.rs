//! Built-in Plugins
//!
//! Plugins compiled into the binary and registered through the discovery
//! inventory.

pub(crate) mod echo;

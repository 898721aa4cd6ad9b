//! Public API for the plugin system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Capability contract and lifecycle helpers
pub use crate::plugin::traits::{FindingSink, PluginLogger, ScanPlugin};

// Finding and configuration model
pub use crate::plugin::config::ScanConfig;
pub use crate::plugin::findings::{sort_by_severity, Finding, FindingKind, Severity};

// Metadata and registration types
pub use crate::plugin::types::{
    PluginCategory, PluginDescriptor, PluginFactory, RegisteredPlugin,
};

// Registry
pub use crate::plugin::registry::{PluginRegistry, SharedPluginRegistry};

// Discovery
pub use crate::plugin::discovery::{
    default_plugin_dir, load_directory, register_builtins, BuiltinPluginEntry,
};

// Manifest-driven external tool plugins
pub use crate::plugin::external::{CommandPlugin, ToolManifest};

// Error handling
pub use crate::plugin::error::{PluginError, PluginResult};

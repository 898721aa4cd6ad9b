//! Plugin Error Handling
//!
//! Error types for plugin operations covering registration, discovery,
//! and runtime failures.

use std::fmt;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Error types for plugin system operations
#[derive(Debug, Clone, PartialEq)]
pub enum PluginError {
    /// Descriptor rejected at registration (e.g. empty id)
    InvalidDescriptor { message: String },

    /// Plugin not found in registry
    PluginNotFound { plugin_id: String },

    /// Plugin failed to load from a manifest or directory
    LoadError { path: String, cause: String },

    /// Plugin execution failed
    ExecutionError { plugin_id: String, cause: String },

    /// Generic plugin error
    Generic { message: String },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::InvalidDescriptor { message } => {
                write!(f, "Invalid plugin descriptor: {}", message)
            }
            PluginError::PluginNotFound { plugin_id } => {
                write!(f, "Plugin not found: {}", plugin_id)
            }
            PluginError::LoadError { path, cause } => {
                write!(f, "Failed to load plugin from '{}': {}", path, cause)
            }
            PluginError::ExecutionError { plugin_id, cause } => {
                write!(f, "Plugin '{}' failed: {}", plugin_id, cause)
            }
            PluginError::Generic { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for PluginError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::PluginNotFound {
            plugin_id: "recon.subfinder".to_string(),
        };
        assert_eq!(err.to_string(), "Plugin not found: recon.subfinder");

        let err = PluginError::ExecutionError {
            plugin_id: "scan.nuclei".to_string(),
            cause: "exit code 2".to_string(),
        };
        assert_eq!(err.to_string(), "Plugin 'scan.nuclei' failed: exit code 2");

        let err = PluginError::InvalidDescriptor {
            message: "plugin id must not be empty".to_string(),
        };
        assert!(err.to_string().contains("Invalid plugin descriptor"));
    }
}

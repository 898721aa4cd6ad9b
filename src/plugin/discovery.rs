//! Plugin Discovery
//!
//! Two discovery sources feed the registry: built-in plugins compiled
//! into the binary and registered through `inventory`, and external tool
//! manifests scanned from a plugin directory. Discovery is tolerant by
//! design: one bad manifest is logged and skipped, never aborting the
//! rest of the scan.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::external::{CommandPlugin, ToolManifest};
use crate::plugin::registry::SharedPluginRegistry;
use crate::plugin::traits::ScanPlugin;
use crate::plugin::types::{PluginDescriptor, PluginFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compile-time registration record for a built-in plugin
pub struct BuiltinPluginEntry {
    pub factory: fn() -> Box<dyn ScanPlugin>,
}

inventory::collect!(BuiltinPluginEntry);

/// Register a built-in plugin type with the discovery inventory
///
/// The type must provide a `new()` constructor.
#[macro_export]
macro_rules! builtin_plugin {
    ($plugin_type:ty) => {
        inventory::submit! {
            $crate::plugin::discovery::BuiltinPluginEntry {
                factory: || Box::new(<$plugin_type>::new()),
            }
        }
    };
}

/// Register every compiled-in plugin with the registry
///
/// Duplicate ids follow first-registration-wins, so calling this more
/// than once is harmless.
pub async fn register_builtins(registry: &SharedPluginRegistry) -> usize {
    let mut registered = 0;

    for entry in inventory::iter::<BuiltinPluginEntry> {
        let descriptor = (entry.factory)().descriptor();
        let plugin_id = descriptor.id.clone();
        let make = entry.factory;
        let factory: PluginFactory = Arc::new(move || make());

        match registry.register(descriptor, factory).await {
            Ok(()) => registered += 1,
            Err(e) => log::warn!("Skipping builtin plugin '{}': {}", plugin_id, e),
        }
    }

    log::debug!("Registered {} builtin plugins", registered);
    registered
}

/// Scan a directory tree for `*.toml` tool manifests and register each
///
/// Per-file failures (unreadable file, malformed manifest, invalid
/// descriptor) are logged and skipped; the scan continues with the
/// remaining candidates. Returns the number of manifests registered.
pub async fn load_directory(
    registry: &SharedPluginRegistry,
    directory: &Path,
) -> PluginResult<usize> {
    if !directory.is_dir() {
        return Err(PluginError::LoadError {
            path: directory.display().to_string(),
            cause: "not a directory".to_string(),
        });
    }

    let pattern = directory.join("**").join("*.toml");
    let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| PluginError::LoadError {
        path: directory.display().to_string(),
        cause: format!("invalid scan pattern: {}", e),
    })?;

    let mut loaded = 0;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping unreadable plugin path: {}", e);
                continue;
            }
        };

        match load_manifest(&path).await {
            Ok((descriptor, factory)) => {
                let plugin_id = descriptor.id.clone();
                match registry.register(descriptor, factory).await {
                    Ok(()) => {
                        log::debug!("Loaded plugin '{}' from {}", plugin_id, path.display());
                        loaded += 1;
                    }
                    Err(e) => log::warn!(
                        "Skipping plugin '{}' from {}: {}",
                        plugin_id,
                        path.display(),
                        e
                    ),
                }
            }
            Err(e) => log::warn!("Skipping plugin manifest {}: {}", path.display(), e),
        }
    }

    log::info!(
        "Loaded {} plugin manifests from {}",
        loaded,
        directory.display()
    );
    Ok(loaded)
}

async fn load_manifest(path: &Path) -> PluginResult<(PluginDescriptor, PluginFactory)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PluginError::LoadError {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

    let manifest = ToolManifest::parse(&raw).map_err(|e| PluginError::LoadError {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;

    let descriptor = manifest.descriptor();
    let manifest = Arc::new(manifest);
    let factory: PluginFactory =
        Arc::new(move || Box::new(CommandPlugin::new(manifest.clone())) as Box<dyn ScanPlugin>);

    Ok((descriptor, factory))
}

/// Platform-specific default plugin directory
pub fn default_plugin_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("scanforge").join("plugins");
    }
    PathBuf::from("./plugins")
}

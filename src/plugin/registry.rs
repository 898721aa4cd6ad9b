//! Plugin Registry
//!
//! Process-wide catalog of plugin descriptors and factories. Initialised
//! once near startup, read-mostly afterwards: lookups take a shared read
//! lock, registration serialises behind a write lock. Duplicate ids are
//! resolved as first-registration-wins so re-running discovery is safe.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::{PluginCategory, PluginDescriptor, PluginFactory, RegisteredPlugin};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Plugin catalog keyed by plugin id
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, RegisteredPlugin>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin descriptor with its factory
    ///
    /// An empty id is rejected. Registering an id that is already present
    /// is a logged no-op: the first registration wins.
    pub fn register(
        &mut self,
        descriptor: PluginDescriptor,
        factory: PluginFactory,
    ) -> PluginResult<()> {
        if descriptor.id.is_empty() {
            return Err(PluginError::InvalidDescriptor {
                message: "plugin id must not be empty".to_string(),
            });
        }

        if self.plugins.contains_key(&descriptor.id) {
            log::debug!(
                "Plugin '{}' already registered, keeping first registration",
                descriptor.id
            );
            return Ok(());
        }

        self.plugins.insert(
            descriptor.id.clone(),
            RegisteredPlugin { descriptor, factory },
        );
        Ok(())
    }

    /// Look up a plugin by id
    pub fn get(&self, plugin_id: &str) -> Option<RegisteredPlugin> {
        self.plugins.get(plugin_id).cloned()
    }

    pub fn has_plugin(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    /// Enabled descriptors in a category; iteration order is not stable
    pub fn by_category(&self, category: PluginCategory) -> Vec<PluginDescriptor> {
        self.plugins
            .values()
            .filter(|plugin| {
                plugin.descriptor.category == category && plugin.descriptor.enabled
            })
            .map(|plugin| plugin.descriptor.clone())
            .collect()
    }

    /// All registered descriptors
    pub fn list_meta(&self) -> Vec<PluginDescriptor> {
        self.plugins
            .values()
            .map(|plugin| plugin.descriptor.clone())
            .collect()
    }

    /// Sorted plugin ids
    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.plugins.len()
    }
}

/// Thread-safe shared plugin registry
///
/// Constructed once at startup and passed to the engine rather than
/// accessed as ambient global state.
#[derive(Debug, Clone, Default)]
pub struct SharedPluginRegistry {
    inner: Arc<RwLock<PluginRegistry>>,
}

impl SharedPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner registry for bulk read/write operations
    pub fn inner(&self) -> &Arc<RwLock<PluginRegistry>> {
        &self.inner
    }

    pub async fn register(
        &self,
        descriptor: PluginDescriptor,
        factory: PluginFactory,
    ) -> PluginResult<()> {
        let mut registry = self.inner.write().await;
        registry.register(descriptor, factory)
    }

    pub async fn get(&self, plugin_id: &str) -> Option<RegisteredPlugin> {
        let registry = self.inner.read().await;
        registry.get(plugin_id)
    }

    pub async fn has_plugin(&self, plugin_id: &str) -> bool {
        let registry = self.inner.read().await;
        registry.has_plugin(plugin_id)
    }

    pub async fn by_category(&self, category: PluginCategory) -> Vec<PluginDescriptor> {
        let registry = self.inner.read().await;
        registry.by_category(category)
    }

    pub async fn list_meta(&self) -> Vec<PluginDescriptor> {
        let registry = self.inner.read().await;
        registry.list_meta()
    }

    pub async fn plugin_ids(&self) -> Vec<String> {
        let registry = self.inner.read().await;
        registry.plugin_ids()
    }

    pub async fn count(&self) -> usize {
        let registry = self.inner.read().await;
        registry.count()
    }
}

//! Type definitions for the plugin system
//!
//! Core data structures for plugin metadata and registration.

use crate::plugin::traits::ScanPlugin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Functional category of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    Recon,
    Scan,
    Exploit,
    Post,
    Ctf,
    Cloud,
    Mobile,
    Crack,
    Util,
}

/// Plugin metadata, immutable once registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique, non-empty, stable identifier (e.g. "recon.subfinder")
    pub id: String,
    /// Display name
    pub name: String,
    pub category: PluginCategory,
    pub description: String,
    pub tags: Vec<String>,
    pub author: String,
    pub version: String,
    /// Ids of plugins this plugin depends on
    pub requires: Vec<String>,
    pub enabled: bool,
}

impl PluginDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PluginCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            tags: Vec::new(),
            author: String::new(),
            version: "1.0.0".to_string(),
            requires: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Factory producing a fresh plugin instance per job
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn ScanPlugin> + Send + Sync>;

/// A descriptor paired with its factory, as held by the registry
#[derive(Clone)]
pub struct RegisteredPlugin {
    pub descriptor: PluginDescriptor,
    pub factory: PluginFactory,
}

impl RegisteredPlugin {
    /// Create a fresh instance for one job
    pub fn instantiate(&self) -> Box<dyn ScanPlugin> {
        (self.factory)()
    }
}

impl fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

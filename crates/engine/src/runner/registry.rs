use crate::core::{Plugin, PluginConfig, PluginDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Builds one plugin instance per invocation from its merged configuration.
pub type PluginFactory = Arc<dyn Fn(PluginConfig) -> Arc<dyn Plugin> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("plugin already registered: {0}")]
    DuplicateName(String),
}

/// Process-wide catalog mapping plugin name to factory. Append-only: built
/// once at startup, then read concurrently without locking for the rest of
/// the process lifetime.
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
    // Registration order, so list() is stable across runs.
    order: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a plugin. Duplicate names are rejected rather than silently
    /// shadowed.
    pub fn register(
        &mut self,
        descriptor: PluginDescriptor,
        factory: PluginFactory,
    ) -> Result<(), RegistryError> {
        if self.factories.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name.to_string()));
        }
        self.factories
            .insert(descriptor.name.to_string(), factory);
        self.order.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PluginFactory> {
        self.factories.get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&PluginDescriptor> {
        self.order.iter().find(|d| d.name == name)
    }

    /// Descriptors in registration order. Restartable: each call starts a
    /// fresh iteration.
    pub fn list(&self) -> impl Iterator<Item = &PluginDescriptor> + '_ {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PluginRegistryBuilder {
    registry: PluginRegistry,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: PluginRegistry::new(),
        }
    }

    pub fn with_plugin(
        mut self,
        descriptor: PluginDescriptor,
        factory: PluginFactory,
    ) -> Result<Self, RegistryError> {
        self.registry.register(descriptor, factory)?;
        Ok(self)
    }

    pub fn build(self) -> PluginRegistry {
        self.registry
    }
}

impl Default for PluginRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

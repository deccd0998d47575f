//! Built-in scanner backends and the startup registration pass.
//!
//! Discovery is an explicit registration call per known backend rather than
//! any runtime lookup: the catalog is fully built before the first scan and
//! never changes afterwards.

pub mod checkov;
pub mod zodiac;

pub use checkov::CheckovPlugin;
pub use zodiac::ZodiacPlugin;

use crate::core::Plugin;
use crate::runner::{PluginRegistry, PluginRegistryBuilder, RegistryError};
use std::sync::Arc;

/// Build the process-wide registry with every built-in backend.
pub fn discover_plugins() -> Result<PluginRegistry, RegistryError> {
    Ok(PluginRegistryBuilder::new()
        .with_plugin(
            CheckovPlugin::descriptor(),
            Arc::new(|config| Arc::new(CheckovPlugin::new(config)) as Arc<dyn Plugin>),
        )?
        .with_plugin(
            ZodiacPlugin::descriptor(),
            Arc::new(|config| Arc::new(ZodiacPlugin::new(config)) as Arc<dyn Plugin>),
        )?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_backends_register_in_order() {
        let registry = discover_plugins().unwrap();
        let names: Vec<_> = registry.list().map(|d| d.name).collect();
        assert_eq!(names, vec!["checkov", "zodiac"]);
        assert!(registry.get("checkov").is_some());
        assert!(registry.get("tfsec").is_none());
    }
}

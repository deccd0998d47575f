pub mod orchestrator;
pub mod registry;

pub use orchestrator::{cancel_pair, CancelHandle, CancelSignal, Orchestrator, RequestError};
pub use registry::{PluginFactory, PluginRegistry, PluginRegistryBuilder, RegistryError};

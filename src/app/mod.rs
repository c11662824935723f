//! Application layer: provider registry and factory.

pub mod factory;
pub mod registry;

pub use factory::ProviderFactory;
pub use registry::{BUILTIN_PROVIDERS, ProviderConstructor, ProviderRegistry};

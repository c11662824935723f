//! Provider adapters and the plumbing they share.

pub mod base;
pub mod onramper;

pub use base::{ConfiguredClient, ProviderCore, ProviderEndpoints};
pub use onramper::OnramperProvider;

//! Infrastructure layer implementations.

pub mod http;
pub mod providers;
pub mod retry;

pub use http::{HttpTransport, TransportConfig, TransportError};
pub use providers::OnramperProvider;
pub use retry::RetryPolicy;

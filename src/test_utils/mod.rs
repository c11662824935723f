//! Test doubles, available to downstream tests via the `test-utils` feature.

pub mod mocks;

pub use mocks::{MOCK_PROVIDER_NAME, MockConfig, MockOnRampProvider};

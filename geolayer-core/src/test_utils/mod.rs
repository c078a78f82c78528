//! In-memory implementations for testing.
//!
//! Available behind the `test-utils` feature flag. These prove the
//! [`crate::FeatureService`] contract is usable without a server.

mod in_memory_service;

pub use in_memory_service::InMemoryFeatureService;

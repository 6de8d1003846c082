//! Doctor Fill Core Library
//!
//! Webhook authentication, GitHub App credentials, and event dispatch for the
//! Doctor Fill GitHub App.

pub mod credentials;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod github;
pub mod handlers;
pub mod webhook;

pub use error::{DrFillError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Test fakes are available for both unit tests and downstream integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

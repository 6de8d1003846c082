//! Webhook verification and parsing.

pub mod envelope;
pub mod events;
pub mod verifier;

pub use envelope::*;
pub use events::*;
pub use verifier::*;

//! Error types for the Doctor Fill core library.

use thiserror::Error;

/// Core error type for Doctor Fill.
#[derive(Error, Debug)]
pub enum DrFillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Malformed signature header")]
    MalformedSignature,

    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Webhook signature mismatch")]
    SignatureMismatch,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub authentication failed: {0}")]
    Auth(String),

    #[error("GitHub API error: {0}")]
    Upstream(String),
}

impl DrFillError {
    /// Returns true for errors that mean the request could not be authenticated.
    ///
    /// These map to a 400 response and never reach a handler.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            DrFillError::MissingHeader(_)
                | DrFillError::MalformedSignature
                | DrFillError::UnsupportedAlgorithm(_)
                | DrFillError::SignatureMismatch
        )
    }
}

/// Result type alias for Doctor Fill operations.
pub type Result<T> = std::result::Result<T, DrFillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failures_are_classified() {
        assert!(DrFillError::MissingHeader("X-Hub-Signature").is_verification_failure());
        assert!(DrFillError::MalformedSignature.is_verification_failure());
        assert!(DrFillError::UnsupportedAlgorithm("md4".into()).is_verification_failure());
        assert!(DrFillError::SignatureMismatch.is_verification_failure());

        assert!(!DrFillError::Auth("bad credentials".into()).is_verification_failure());
        assert!(!DrFillError::Upstream("404".into()).is_verification_failure());
        assert!(!DrFillError::Config("missing ID".into()).is_verification_failure());
    }
}

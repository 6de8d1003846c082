//! Webhook signature verification.

use crate::crypto::verify_signature;
use crate::error::{DrFillError, Result};

/// Verifier for GitHub webhook signatures.
pub struct WebhookVerifier<'a> {
    secret: &'a [u8],
}

impl<'a> WebhookVerifier<'a> {
    /// Creates a new verifier with the webhook secret bytes.
    pub fn new(secret: &'a [u8]) -> Self {
        Self { secret }
    }

    /// Verifies a webhook signature.
    ///
    /// # Arguments
    /// * `signature` - The signature header value, `algorithm=hexdigest`
    /// * `body` - The raw request body
    pub fn verify(&self, signature: &str, body: &[u8]) -> Result<bool> {
        verify_signature(signature, body, self.secret)
    }

    /// Like [`verify`](Self::verify), but a digest mismatch is an error.
    pub fn authenticate(&self, signature: &str, body: &[u8]) -> Result<()> {
        if self.verify(signature, body)? {
            Ok(())
        } else {
            Err(DrFillError::SignatureMismatch)
        }
    }
}

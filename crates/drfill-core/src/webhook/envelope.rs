//! Raw webhook deliveries and the verified form handlers are allowed to see.

use bytes::Bytes;

use super::verifier::WebhookVerifier;
use crate::error::{DrFillError, Result};

/// Signature header carrying `algorithm=hexdigest`.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
/// SHA-256 variant of the signature header, preferred when present.
pub const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";
/// Event type header.
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Unique delivery ID header.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// A webhook delivery as received, before authentication.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub signature_header: Option<String>,
    pub event_type: Option<String>,
    pub delivery_id: Option<String>,
    pub raw_body: Bytes,
}

impl WebhookEnvelope {
    /// Authenticates the delivery against the webhook secret.
    ///
    /// The signature is checked over the raw body before the event type is
    /// looked at and before anything is parsed.
    pub fn verify(self, verifier: &WebhookVerifier<'_>) -> Result<VerifiedEnvelope> {
        let signature = self
            .signature_header
            .as_deref()
            .ok_or(DrFillError::MissingHeader(SIGNATURE_HEADER))?;

        verifier.authenticate(signature, &self.raw_body)?;

        let event_type = self
            .event_type
            .ok_or(DrFillError::MissingHeader(EVENT_HEADER))?;

        Ok(VerifiedEnvelope {
            event_type,
            delivery_id: self.delivery_id,
            raw_body: self.raw_body,
        })
    }
}

/// A delivery whose body has passed signature verification.
///
/// Only [`WebhookEnvelope::verify`] constructs this, and the body it carries
/// is exactly the one that was verified.
#[derive(Debug, Clone)]
pub struct VerifiedEnvelope {
    event_type: String,
    delivery_id: Option<String>,
    raw_body: Bytes,
}

impl VerifiedEnvelope {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn delivery_id(&self) -> Option<&str> {
        self.delivery_id.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.raw_body
    }
}

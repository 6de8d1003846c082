//! Cryptographic utilities for webhook verification.

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{DrFillError, Result};

/// Maximum webhook payload size (10MB).
pub const MAX_WEBHOOK_SIZE: usize = 10 * 1024 * 1024;

/// Digest algorithms accepted in the `algorithm=hexdigest` signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DrFillError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            other => Err(DrFillError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

fn mac_hex<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> String {
    let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Computes the HMAC of data with the given key and returns it as lowercase hex.
pub fn hmac_hex(algorithm: DigestAlgorithm, key: &[u8], data: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Sha1 => mac_hex::<Hmac<Sha1>>(key, data),
        DigestAlgorithm::Sha256 => mac_hex::<Hmac<Sha256>>(key, data),
        DigestAlgorithm::Sha384 => mac_hex::<Hmac<Sha384>>(key, data),
        DigestAlgorithm::Sha512 => mac_hex::<Hmac<Sha512>>(key, data),
    }
}

/// Builds a signature header value (`algorithm=hexdigest`) for a body.
pub fn signature_header(algorithm: DigestAlgorithm, secret: &[u8], body: &[u8]) -> String {
    format!("{}={}", algorithm, hmac_hex(algorithm, secret, body))
}

/// Verifies a webhook signature header against the raw body.
///
/// The header has the form `algorithm=hexdigest` and is split on the first `=`.
/// Returns `Ok(false)` on a digest mismatch, `MalformedSignature` when the header
/// has no `=`, and `UnsupportedAlgorithm` before any digest is computed when the
/// algorithm is unknown.
pub fn verify_signature(signature_header: &str, body: &[u8], secret: &[u8]) -> Result<bool> {
    let (algorithm, received) = signature_header
        .split_once('=')
        .ok_or(DrFillError::MalformedSignature)?;
    let algorithm: DigestAlgorithm = algorithm.parse()?;

    let computed = hmac_hex(algorithm, secret, body);
    tracing::debug!(%algorithm, received, computed = %computed, "Comparing webhook digests");

    Ok(constant_time_eq(received.as_bytes(), computed.as_bytes()))
}

/// Constant-time equality comparison.
///
/// Only the length check can return early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

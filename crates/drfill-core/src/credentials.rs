//! GitHub App identity loading.
//!
//! The identity is read once at startup, either from a JSON credentials file
//! with the keys `ID`, `WEBHOOK_SECRET` and `PRIVATE_KEY_FILE`, or from the
//! `DRFILL_ID`, `DRFILL_WEBHOOK_SECRET` and `DRFILL_PRIVATE_KEY_FILE`
//! environment variables. Any failure here is fatal.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonwebtoken::EncodingKey;
use secrecy::{ExposeSecret, SecretSlice};
use serde::Deserialize;

use crate::error::{DrFillError, Result};

pub const ENV_ID: &str = "DRFILL_ID";
pub const ENV_WEBHOOK_SECRET: &str = "DRFILL_WEBHOOK_SECRET";
pub const ENV_PRIVATE_KEY_FILE: &str = "DRFILL_PRIVATE_KEY_FILE";

/// Where the App credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// JSON credentials file.
    File(PathBuf),
    /// `DRFILL_*` environment variables.
    Env,
}

/// The App's long-lived identity.
///
/// Immutable after load and shared read-only between requests.
pub struct IntegrationIdentity {
    app_id: i64,
    encoding_key: EncodingKey,
    webhook_secret: SecretSlice<u8>,
}

impl fmt::Debug for IntegrationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationIdentity")
            .field("app_id", &self.app_id)
            .field("encoding_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AppIdField {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "ID")]
    id: Option<AppIdField>,
    #[serde(rename = "WEBHOOK_SECRET")]
    webhook_secret: Option<String>,
    #[serde(rename = "PRIVATE_KEY_FILE")]
    private_key_file: Option<PathBuf>,
}

impl IntegrationIdentity {
    /// Loads the identity from the given source.
    pub fn load(source: &CredentialSource) -> Result<Self> {
        let identity = match source {
            CredentialSource::File(path) => Self::from_file(path)?,
            CredentialSource::Env => Self::from_env()?,
        };
        tracing::info!(app_id = identity.app_id, "Loaded GitHub App credentials");
        Ok(identity)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DrFillError::Config(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: CredentialsFile = serde_json::from_str(&raw).map_err(|e| {
            DrFillError::Config(format!(
                "Invalid credentials file {}: {}",
                path.display(),
                e
            ))
        })?;

        let app_id = match file.id.ok_or_else(|| missing_key("ID"))? {
            AppIdField::Number(id) => id,
            AppIdField::Text(text) => parse_app_id(&text)?,
        };
        let webhook_secret = file
            .webhook_secret
            .ok_or_else(|| missing_key("WEBHOOK_SECRET"))?;
        let private_key_file = file
            .private_key_file
            .ok_or_else(|| missing_key("PRIVATE_KEY_FILE"))?;

        // A relative key path is resolved against the credentials file.
        let private_key_file = match path.parent() {
            Some(dir) if private_key_file.is_relative() => dir.join(private_key_file),
            _ => private_key_file,
        };

        Self::from_parts(app_id, webhook_secret, &private_key_file)
    }

    fn from_env() -> Result<Self> {
        let var = |name: &'static str| {
            std::env::var(name)
                .map_err(|_| DrFillError::Config(format!("Missing environment variable: {}", name)))
        };

        let app_id = parse_app_id(&var(ENV_ID)?)?;
        let webhook_secret = var(ENV_WEBHOOK_SECRET)?;
        let private_key_file = PathBuf::from(var(ENV_PRIVATE_KEY_FILE)?);

        Self::from_parts(app_id, webhook_secret, &private_key_file)
    }

    /// Builds an identity from its parts, reading and validating the private key.
    pub fn from_parts(app_id: i64, webhook_secret: String, private_key_file: &Path) -> Result<Self> {
        let private_key = std::fs::read_to_string(private_key_file).map_err(|e| {
            DrFillError::Config(format!(
                "Failed to read private key file {}: {}",
                private_key_file.display(),
                e
            ))
        })?;

        Self::from_pem(app_id, webhook_secret, &private_key)
    }

    /// Builds an identity from an in-memory PEM key.
    pub fn from_pem(app_id: i64, webhook_secret: String, private_key: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| DrFillError::Config(format!("Invalid RSA private key: {}", e)))?;

        Ok(Self {
            app_id,
            encoding_key,
            webhook_secret: SecretSlice::from(webhook_secret.into_bytes()),
        })
    }

    pub fn app_id(&self) -> i64 {
        self.app_id
    }

    /// The parsed RS256 signing key.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The webhook secret as raw bytes, ready for HMAC keying.
    pub fn webhook_secret(&self) -> &[u8] {
        self.webhook_secret.expose_secret()
    }
}

fn missing_key(key: &str) -> DrFillError {
    DrFillError::Config(format!("Missing key in credentials file: {}", key))
}

fn parse_app_id(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| DrFillError::Config(format!("App ID is not an integer: {:?}", text)))
}

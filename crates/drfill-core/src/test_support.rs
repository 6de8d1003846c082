//! In-memory stand-ins for the GitHub seams, shared by unit and integration tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};

use crate::credentials::IntegrationIdentity;
use crate::crypto::{DigestAlgorithm, signature_header};
use crate::error::{DrFillError, Result};
use crate::github::{ClientFactory, FileContents, FileUpdate, InstallationToken, RepoClient, TokenSource};
use crate::webhook::{
    Commit, Installation, Issue, IssuesEvent, PushEvent, Repository, VerifiedEnvelope,
    WebhookEnvelope, WebhookVerifier,
};

pub const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/app-key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/app-key.pub.pem");
pub const TEST_APP_ID: i64 = 1234;
pub const TEST_REPO: &str = "octo/hello";

/// Writes the test private key as `app-key.pem` into `dir`.
pub fn write_key_file(dir: &Path) -> PathBuf {
    let path = dir.join("app-key.pem");
    std::fs::write(&path, TEST_PRIVATE_KEY).expect("Failed to write test key");
    path
}

pub fn test_identity(webhook_secret: &str) -> Arc<IntegrationIdentity> {
    Arc::new(
        IntegrationIdentity::from_pem(
            TEST_APP_ID,
            webhook_secret.to_string(),
            TEST_PRIVATE_KEY,
        )
        .expect("Test key must parse"),
    )
}

/// Signs and verifies a JSON body, yielding an envelope handlers can consume.
pub fn verified_envelope(event_type: &str, body: &serde_json::Value) -> VerifiedEnvelope {
    let secret = b"test-support-secret";
    let body = Bytes::from(body.to_string());
    WebhookEnvelope {
        signature_header: Some(signature_header(DigestAlgorithm::Sha256, secret, &body)),
        event_type: Some(event_type.to_string()),
        delivery_id: None,
        raw_body: body,
    }
    .verify(&WebhookVerifier::new(secret))
    .expect("Self-signed envelope must verify")
}

pub fn push_event(git_ref: &str, commits: &[&[&str]], installation: Option<i64>) -> PushEvent {
    PushEvent {
        git_ref: git_ref.to_string(),
        commits: commits
            .iter()
            .enumerate()
            .map(|(i, added)| Commit {
                id: format!("c{}", i),
                added: added.iter().map(|s| s.to_string()).collect(),
            })
            .collect(),
        repository: Repository {
            full_name: TEST_REPO.to_string(),
        },
        installation: installation.map(|id| Installation { id }),
    }
}

pub fn issue_opened_event(number: u64, installation: Option<i64>) -> IssuesEvent {
    IssuesEvent {
        action: "opened".to_string(),
        issue: Issue { number },
        repository: Repository {
            full_name: TEST_REPO.to_string(),
        },
        installation: installation.map(|id| Installation { id }),
    }
}

/// Token source that records requests and hands out tokens with a fixed lifetime.
#[derive(Clone)]
pub struct StaticTokenSource {
    lifetime: Option<Duration>,
    requested: Arc<Mutex<Vec<i64>>>,
}

impl StaticTokenSource {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            requested: Arc::default(),
        }
    }

    /// A source whose every exchange is rejected.
    pub fn failing() -> Self {
        Self {
            lifetime: None,
            requested: Arc::default(),
        }
    }

    pub fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn installation_token(&self, installation_id: i64) -> Result<InstallationToken> {
        self.requested.lock().unwrap().push(installation_id);
        match self.lifetime {
            Some(lifetime) => Ok(InstallationToken::new(
                format!("ghs_test_{}", installation_id),
                installation_id,
                Utc::now() + lifetime,
            )),
            None => Err(DrFillError::Auth("Bad credentials".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub repo: String,
    pub path: String,
    pub message: String,
    pub content: Vec<u8>,
    pub sha: String,
    pub branch: String,
}

#[derive(Default)]
struct FakeRepoState {
    files: HashMap<String, Vec<u8>>,
    failing_updates: HashSet<String>,
    failing_labels: bool,
    fetched: Vec<String>,
    updates: Vec<RecordedUpdate>,
    labels: Vec<(String, u64, Vec<String>)>,
    token_installations: Vec<i64>,
}

/// In-memory repository. Clones share state, so a test can keep one handle
/// and give another to the code under test.
#[derive(Clone, Default)]
pub struct FakeRepoClient {
    state: Arc<Mutex<FakeRepoState>>,
}

impl FakeRepoClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_vec());
        self
    }

    pub fn failing_update(self, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(path.to_string());
        self
    }

    pub fn failing_labels(self) -> Self {
        self.state.lock().unwrap().failing_labels = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched.clone()
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn labels(&self) -> Vec<(String, u64, Vec<String>)> {
        self.state.lock().unwrap().labels.clone()
    }

    /// Installation ids of the tokens clients were built with.
    pub fn token_installations(&self) -> Vec<i64> {
        self.state.lock().unwrap().token_installations.clone()
    }
}

#[async_trait]
impl RepoClient for FakeRepoClient {
    async fn get_file(&self, _repo: &str, path: &str, _git_ref: &str) -> Result<FileContents> {
        let mut state = self.state.lock().unwrap();
        state.fetched.push(path.to_string());
        let content = state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| DrFillError::Upstream(format!("404 Not Found: {}", path)))?;

        Ok(FileContents {
            path: path.to_string(),
            sha: format!("sha-{}", path),
            content,
        })
    }

    async fn update_file(&self, repo: &str, update: &FileUpdate<'_>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(update.path) {
            return Err(DrFillError::Upstream(format!("409 Conflict: {}", update.path)));
        }

        state.updates.push(RecordedUpdate {
            repo: repo.to_string(),
            path: update.path.to_string(),
            message: update.message.clone(),
            content: update.content.to_vec(),
            sha: update.sha.to_string(),
            branch: update.branch.to_string(),
        });
        Ok(())
    }

    async fn add_labels(&self, repo: &str, issue_number: u64, labels: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_labels {
            return Err(DrFillError::Upstream("422 Validation Failed".to_string()));
        }

        state
            .labels
            .push((repo.to_string(), issue_number, labels.to_vec()));
        Ok(())
    }
}

/// Hands out the same [`FakeRepoClient`] for every installation.
pub struct FakeClientFactory {
    client: FakeRepoClient,
}

impl FakeClientFactory {
    pub fn new(client: FakeRepoClient) -> Self {
        Self { client }
    }
}

impl ClientFactory for FakeClientFactory {
    fn for_installation(&self, token: InstallationToken) -> Arc<dyn RepoClient> {
        self.client
            .state
            .lock()
            .unwrap()
            .token_installations
            .push(token.installation_id());
        Arc::new(self.client.clone())
    }
}

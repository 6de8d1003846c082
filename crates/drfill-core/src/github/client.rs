//! Installation-scoped GitHub REST client.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{GitHubApi, error_body, github_headers};
use super::token::InstallationToken;
use crate::error::{DrFillError, Result};

/// A file read through the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub path: String,
    pub sha: String,
    pub content: Vec<u8>,
}

/// A commit that replaces one file.
#[derive(Debug, Clone)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub message: String,
    pub content: &'a [u8],
    /// Blob SHA of the file being replaced.
    pub sha: &'a str,
    pub branch: &'a str,
}

/// The repository operations handlers may perform.
#[async_trait]
pub trait RepoClient: Send + Sync {
    async fn get_file(&self, repo: &str, path: &str, git_ref: &str) -> Result<FileContents>;

    async fn update_file(&self, repo: &str, update: &FileUpdate<'_>) -> Result<()>;

    async fn add_labels(&self, repo: &str, issue_number: u64, labels: &[String]) -> Result<()>;
}

/// Builds a client for one installation token.
pub trait ClientFactory: Send + Sync {
    fn for_installation(&self, token: InstallationToken) -> Arc<dyn RepoClient>;
}

/// [`RepoClient`] backed by the GitHub REST API.
pub struct GitHubClient {
    api: GitHubApi,
    token: InstallationToken,
}

impl GitHubClient {
    pub fn new(api: GitHubApi, token: InstallationToken) -> Self {
        Self { api, token }
    }
}

#[derive(Deserialize)]
struct ContentResponse {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct LabelsRequest<'a> {
    labels: &'a [String],
}

#[async_trait]
impl RepoClient for GitHubClient {
    async fn get_file(&self, repo: &str, path: &str, git_ref: &str) -> Result<FileContents> {
        let mut url = self.api.url(["repos", repo, "contents", path]);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = github_headers(self.api.http().get(url), self.token.value())
            .send()
            .await
            .map_err(|e| DrFillError::Upstream(format!("GitHub API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DrFillError::Upstream(format!(
                "Could not get contents of {}: {}",
                path,
                error_body(response).await
            )));
        }

        let file: ContentResponse = response
            .json()
            .await
            .map_err(|e| DrFillError::Upstream(format!("Failed to parse contents of {}: {}", path, e)))?;

        if file.kind != "file" || file.encoding != "base64" {
            return Err(DrFillError::Upstream(format!(
                "{} is a {} with {:?} encoding, not a base64 file",
                path, file.kind, file.encoding
            )));
        }

        // The API wraps base64 content at 60 columns.
        let packed: String = file.content.split_whitespace().collect();
        let content = STANDARD
            .decode(packed)
            .map_err(|e| DrFillError::Upstream(format!("Invalid base64 in {}: {}", path, e)))?;

        Ok(FileContents {
            path: file.path,
            sha: file.sha,
            content,
        })
    }

    async fn update_file(&self, repo: &str, update: &FileUpdate<'_>) -> Result<()> {
        let url = self.api.url(["repos", repo, "contents", update.path]);
        let body = UpdateRequest {
            message: &update.message,
            content: STANDARD.encode(update.content),
            sha: update.sha,
            branch: update.branch,
        };

        let response = github_headers(self.api.http().put(url), self.token.value())
            .json(&body)
            .send()
            .await
            .map_err(|e| DrFillError::Upstream(format!("GitHub API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DrFillError::Upstream(format!(
                "Could not commit modified file {}: {}",
                update.path,
                error_body(response).await
            )));
        }

        Ok(())
    }

    async fn add_labels(&self, repo: &str, issue_number: u64, labels: &[String]) -> Result<()> {
        let number = issue_number.to_string();
        let url = self.api.url(["repos", repo, "issues", &number, "labels"]);

        let response = github_headers(self.api.http().post(url), self.token.value())
            .json(&LabelsRequest { labels })
            .send()
            .await
            .map_err(|e| DrFillError::Upstream(format!("GitHub API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DrFillError::Upstream(format!(
                "Could not label issue #{}: {}",
                issue_number,
                error_body(response).await
            )));
        }

        Ok(())
    }
}

/// Creates [`GitHubClient`]s that share one connection pool.
pub struct GitHubClientFactory {
    api: GitHubApi,
}

impl GitHubClientFactory {
    pub fn new(api: GitHubApi) -> Self {
        Self { api }
    }
}

impl ClientFactory for GitHubClientFactory {
    fn for_installation(&self, token: InstallationToken) -> Arc<dyn RepoClient> {
        Arc::new(GitHubClient::new(self.api.clone(), token))
    }
}

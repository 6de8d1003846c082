//! GitHub App authentication and the installation-scoped REST client.

pub mod client;
pub mod token;

pub use client::*;
pub use token::*;

use std::time::Duration;

use reqwest::RequestBuilder;
use url::Url;

use crate::error::{DrFillError, Result};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("drfill/", env!("CARGO_PKG_VERSION"));

/// Base URL plus the shared HTTP client used for every GitHub call.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    base: Url,
    http: reqwest::Client,
}

impl GitHubApi {
    /// Creates the API handle. Every request made through it is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| DrFillError::Config(format!("Invalid GitHub API URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(DrFillError::Config(format!(
                "Invalid GitHub API URL {}: not a base URL",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DrFillError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base, http })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one.
    ///
    /// Segments containing `/` (repository full names, file paths) are split.
    pub fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }
}

/// Adds the headers every GitHub REST call carries.
pub(crate) fn github_headers(request: RequestBuilder, bearer: &str) -> RequestBuilder {
    request
        .header("Accept", "application/vnd.github+json")
        .header("Authorization", format!("Bearer {}", bearer))
        .header("X-GitHub-Api-Version", "2022-11-28")
}

/// Reads an error response body into a message.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("{}: {}", status, body)
}

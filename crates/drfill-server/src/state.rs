//! Application state for the Doctor Fill server.

use drfill_core::credentials::{CredentialSource, IntegrationIdentity};
use drfill_core::dispatch::Dispatcher;
use drfill_core::github::{
    CachingTokenSource, GITHUB_API_BASE, GitHubApi, GitHubClientFactory, GitHubTokenExchanger,
    TokenSource,
};
use drfill_core::handlers::{AppendLine, ContentHandler, ExtensionAllowlist, LabelHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Cli;

/// Server configuration, from the command line and environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub credentials: CredentialSource,
    pub api_base_url: String,
    /// Bound on each outbound GitHub call.
    pub http_timeout: Duration,
    /// Bound on handling one delivery end to end.
    pub request_timeout: Duration,
    pub extensions: ExtensionAllowlist,
    pub cache_tokens: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            credentials: CredentialSource::Env,
            api_base_url: GITHUB_API_BASE.to_string(),
            http_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            extensions: ExtensionAllowlist::default(),
            cache_tokens: false,
        }
    }
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            bind: cli.bind,
            credentials: cli
                .credentials
                .map(CredentialSource::File)
                .unwrap_or(CredentialSource::Env),
            api_base_url: cli.api_base_url,
            http_timeout: Duration::from_secs(cli.http_timeout_secs),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            extensions: cli.extensions,
            cache_tokens: cli.cache_tokens,
        }
    }
}

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// The App identity; its webhook secret authenticates deliveries.
    pub identity: Arc<IntegrationIdentity>,
    /// Routes verified events to handlers.
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(identity: Arc<IntegrationIdentity>, dispatcher: Dispatcher) -> Self {
        Self {
            identity,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Wires the GitHub-backed token exchanger, client factory and default handlers.
    pub fn from_config(
        config: &ServerConfig,
        identity: Arc<IntegrationIdentity>,
    ) -> drfill_core::Result<Self> {
        let api = GitHubApi::new(&config.api_base_url, config.http_timeout)?;

        let exchanger = GitHubTokenExchanger::new(api.clone(), identity.clone());
        let tokens: Arc<dyn TokenSource> = if config.cache_tokens {
            Arc::new(CachingTokenSource::new(exchanger))
        } else {
            Arc::new(exchanger)
        };

        let dispatcher = Dispatcher::new(
            tokens,
            Arc::new(GitHubClientFactory::new(api)),
            Arc::new(ContentHandler::new(
                config.extensions.clone(),
                AppendLine::default(),
            )),
            Arc::new(LabelHandler::default()),
        );

        Ok(Self::new(identity, dispatcher))
    }
}

use clap::Parser;
use drfill_core::github::GITHUB_API_BASE;
use drfill_core::handlers::ExtensionAllowlist;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Doctor Fill - a GitHub App that keeps SDK repos healthy and happy
#[derive(Parser, Debug)]
#[command(name = "drfill")]
#[command(version = drfill_core::VERSION)]
#[command(about = "Doctor Fill GitHub App webhook server", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "DRFILL_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// JSON credentials file with ID, WEBHOOK_SECRET and PRIVATE_KEY_FILE
    /// (read from DRFILL_ID, DRFILL_WEBHOOK_SECRET, DRFILL_PRIVATE_KEY_FILE when omitted)
    #[arg(long, env = "DRFILL_CREDENTIALS_FILE")]
    pub credentials: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long, env = "DRFILL_API_BASE_URL", default_value = GITHUB_API_BASE)]
    pub api_base_url: String,

    /// Timeout for each outbound GitHub API call, in seconds
    #[arg(long, env = "DRFILL_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Timeout for handling one webhook delivery, in seconds
    #[arg(long, env = "DRFILL_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Comma-separated file extensions eligible for patching
    #[arg(long, env = "DRFILL_EXTENSIONS", default_value_t = ExtensionAllowlist::default())]
    pub extensions: ExtensionAllowlist,

    /// Reuse installation tokens until they are close to expiry
    #[arg(long, env = "DRFILL_CACHE_TOKENS")]
    pub cache_tokens: bool,
}

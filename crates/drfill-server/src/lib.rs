//! Doctor Fill server library.
//!
//! This library exposes the server components for use in integration tests.

pub mod cli;
pub mod routes;
pub mod state;

pub use state::{AppState, ServerConfig};

use axum::{Router, extract::DefaultBodyLimit, http::StatusCode};
use drfill_core::crypto::MAX_WEBHOOK_SIZE;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

// Re-export drfill_core for convenience
pub use drfill_core;

/// Log target for rejected deliveries, kept apart from operational logs.
pub const SECURITY_LOG_TARGET: &str = "drfill_server::security";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "drfill_server=info,drfill_core=info,tower_http=info";

/// Builds the full application: the webhook router plus request tracing, a
/// per-delivery timeout and the webhook body size limit.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    routes::router(state)
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_SIZE))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                )),
        )
}

// Test utilities are available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

    #[test]
    fn test_default_filter_keeps_security_log() {
        let subscriber = Registry::default().with(EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::event_enabled!(target: SECURITY_LOG_TARGET, Level::ERROR));
            assert!(tracing::event_enabled!(target: "drfill_core::dispatch", Level::INFO));
            assert!(!tracing::event_enabled!(target: "hyper::proto", Level::DEBUG));
        });
    }
}

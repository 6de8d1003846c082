//! Test utilities for drfill-server integration tests.

use axum::Router;
use chrono::Duration;
use drfill_core::crypto::{DigestAlgorithm, signature_header};
use drfill_core::dispatch::Dispatcher;
use drfill_core::handlers::{ContentHandler, LabelHandler};
use drfill_core::test_support::{FakeClientFactory, FakeRepoClient, StaticTokenSource, test_identity};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::state::{AppState, ServerConfig};

/// Webhook secret used in all tests.
pub const TEST_WEBHOOK_SECRET: &str = "s3cr3t";

/// A test application and handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub tokens: StaticTokenSource,
    pub client: FakeRepoClient,
}

/// Creates test application state backed by the given fakes.
pub fn setup_test_state(tokens: StaticTokenSource, client: FakeRepoClient) -> AppState {
    let dispatcher = Dispatcher::new(
        Arc::new(tokens),
        Arc::new(FakeClientFactory::new(client)),
        Arc::new(ContentHandler::default()),
        Arc::new(LabelHandler::default()),
    );

    AppState::new(test_identity(TEST_WEBHOOK_SECRET), dispatcher)
}

/// Creates a test application with the given fakes.
pub fn create_test_app_with(tokens: StaticTokenSource, client: FakeRepoClient) -> TestApp {
    let state = setup_test_state(tokens.clone(), client.clone());
    let router = crate::app(state, &ServerConfig::default());

    TestApp {
        router,
        tokens,
        client,
    }
}

/// Creates a test application whose token exchanges succeed.
pub fn create_test_app(client: FakeRepoClient) -> TestApp {
    create_test_app_with(StaticTokenSource::new(Duration::hours(1)), client)
}

/// Signs a body with the test secret, as GitHub would.
pub fn sign(body: &[u8]) -> String {
    sign_with(TEST_WEBHOOK_SECRET, body)
}

/// Signs a body with an arbitrary secret.
pub fn sign_with(secret: &str, body: &[u8]) -> String {
    signature_header(DigestAlgorithm::Sha256, secret.as_bytes(), body)
}

/// A log event recorded by [`LogCapture`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Layer that records every event it sees.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Captures events on the current thread until the guard is dropped.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Whether an event with this level and target has a message containing `text`.
    pub fn contains(&self, level: Level, target: &str, text: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.level == level && e.target == target && e.message.contains(text))
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}

//! The GitHub webhook endpoint.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use drfill_core::{
    dispatch::DispatchOutcome,
    webhook::{
        DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_256_HEADER, SIGNATURE_HEADER, VerifiedEnvelope,
        WebhookEnvelope, WebhookEvent, WebhookVerifier,
    },
};
use tracing::Instrument;

use crate::SECURITY_LOG_TARGET;
use crate::state::AppState;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Handler for GitHub webhooks.
///
/// POST /
///
/// Any delivery that fails authentication gets 400 and a log line on
/// [`SECURITY_LOG_TARGET`]. Every authenticated delivery gets 200, whatever
/// happens while handling it, so GitHub does not redeliver events we have
/// already seen.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    tracing::info!("Received POST / request");

    let envelope = WebhookEnvelope {
        signature_header: header(&headers, SIGNATURE_256_HEADER)
            .or_else(|| header(&headers, SIGNATURE_HEADER)),
        event_type: header(&headers, EVENT_HEADER),
        delivery_id: header(&headers, DELIVERY_HEADER),
        raw_body: body,
    };

    // Verify before anything looks at the body
    let verifier = WebhookVerifier::new(state.identity.webhook_secret());
    let verified = match envelope.verify(&verifier) {
        Ok(verified) => verified,
        Err(e) if e.is_verification_failure() => {
            tracing::error!(target: SECURITY_LOG_TARGET, "Rejected webhook delivery: {}", e);
            return (StatusCode::BAD_REQUEST, Json("Bad Request"));
        }
        Err(e) => {
            tracing::error!("Failed to verify webhook delivery: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Internal Server Error"));
        }
    };

    let span = tracing::info_span!(
        "delivery",
        id = verified.delivery_id().unwrap_or("-"),
        event = verified.event_type()
    );
    process(&state, &verified).instrument(span).await;

    (StatusCode::OK, Json("OK"))
}

async fn process(state: &AppState, verified: &VerifiedEnvelope) {
    let event = match WebhookEvent::parse(verified) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Could not parse verified payload: {}", e);
            return;
        }
    };

    tracing::info!("GitHub event notification: {}", event.event_type());
    if let Some(action) = event.action() {
        tracing::info!("Event action: {}", action);
    }

    match state.dispatcher.dispatch(event).await {
        DispatchOutcome::Ignored => {
            tracing::debug!("No handler registered, ignoring");
        }
        DispatchOutcome::Completed(report) => {
            report.log_failures();
            tracing::info!("Processed event: {}", report);
        }
        DispatchOutcome::Errored(e) => {
            tracing::error!("Failed to process event: {}", e);
        }
    }
}

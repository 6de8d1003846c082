//! HTTP route handlers.

pub mod webhook;

use axum::{Router, routing::post};

use crate::state::AppState;

/// The webhook router. `POST /` is the only endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(webhook::handle_webhook))
        .with_state(state)
}

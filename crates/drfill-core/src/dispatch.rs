//! Routing verified events to handlers.
//!
//! For each event that needs API access the dispatcher obtains a token for
//! the event's installation, builds a client scoped to it, and hands both to
//! the handler registered for the event. It knows nothing about what the
//! handlers do.

use std::sync::Arc;

use crate::error::{DrFillError, Result};
use crate::github::{ClientFactory, RepoClient, TokenSource};
use crate::handlers::{BatchReport, IssuesHandler, ItemOutcome, PushHandler};
use crate::webhook::WebhookEvent;

/// What happened to a verified event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No handler is registered for the event, or it needs no action.
    Ignored,
    /// Routed and handled; individual items may still have failed.
    Completed(BatchReport),
    /// The event could not be handled (token exchange, payload or handler failure).
    Errored(DrFillError),
}

pub struct Dispatcher {
    tokens: Arc<dyn TokenSource>,
    clients: Arc<dyn ClientFactory>,
    push: Arc<dyn PushHandler>,
    issues: Arc<dyn IssuesHandler>,
}

impl Dispatcher {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        clients: Arc<dyn ClientFactory>,
        push: Arc<dyn PushHandler>,
        issues: Arc<dyn IssuesHandler>,
    ) -> Self {
        Self {
            tokens,
            clients,
            push,
            issues,
        }
    }

    /// Dispatches one event. Never fails; errors are reported in the outcome.
    pub async fn dispatch(&self, event: WebhookEvent) -> DispatchOutcome {
        if let WebhookEvent::Ignored { event_type, action } = &event {
            tracing::debug!("Ignoring event {} (action {:?})", event_type, action);
            return DispatchOutcome::Ignored;
        }

        // Only branches can be committed to, so tag pushes need no token.
        if let WebhookEvent::Push(push) = &event {
            if push.branch().is_none() {
                tracing::info!("Ignoring push to non-branch ref {}", push.git_ref);
                return DispatchOutcome::Ignored;
            }
        }

        match self.route(&event).await {
            Ok(report) => DispatchOutcome::Completed(report),
            Err(e) => DispatchOutcome::Errored(e),
        }
    }

    async fn route(&self, event: &WebhookEvent) -> Result<BatchReport> {
        let client = self.client_for(event).await?;

        match event {
            WebhookEvent::Push(push) => Ok(self.push.handle_push(client.as_ref(), push).await),
            WebhookEvent::IssueOpened(issue) => {
                self.issues
                    .handle_issue_opened(client.as_ref(), issue)
                    .await?;
                let mut report = BatchReport::default();
                report.push(format!("issue #{}", issue.issue.number), ItemOutcome::Updated);
                Ok(report)
            }
            WebhookEvent::Ignored { .. } => Ok(BatchReport::default()),
        }
    }

    async fn client_for(&self, event: &WebhookEvent) -> Result<Arc<dyn RepoClient>> {
        let installation_id = event.installation_id().ok_or_else(|| {
            DrFillError::InvalidPayload(format!(
                "{} event has no installation",
                event.event_type()
            ))
        })?;

        let token = self.tokens.installation_token(installation_id).await?;
        Ok(self.clients.for_installation(token))
    }
}

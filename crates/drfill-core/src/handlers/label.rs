//! Labeling newly opened issues.

use async_trait::async_trait;

use super::IssuesHandler;
use crate::error::Result;
use crate::github::RepoClient;
use crate::webhook::IssuesEvent;

pub const DEFAULT_LABEL: &str = "enhancement";

/// Adds a fixed set of labels to every opened issue. Handy for checking that
/// the App is installed and receiving events.
#[derive(Debug, Clone)]
pub struct LabelHandler {
    labels: Vec<String>,
}

impl LabelHandler {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

impl Default for LabelHandler {
    fn default() -> Self {
        Self::new(vec![DEFAULT_LABEL.to_string()])
    }
}

#[async_trait]
impl IssuesHandler for LabelHandler {
    async fn handle_issue_opened(&self, client: &dyn RepoClient, event: &IssuesEvent) -> Result<()> {
        let number = event.issue.number;
        client
            .add_labels(&event.repository.full_name, number, &self.labels)
            .await?;

        tracing::info!("Added labels {:?} to issue #{}", self.labels, number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrFillError;
    use crate::test_support::{FakeRepoClient, issue_opened_event};

    #[tokio::test]
    async fn test_labels_opened_issue() {
        let client = FakeRepoClient::new();
        let event = issue_opened_event(12, Some(3));

        LabelHandler::default()
            .handle_issue_opened(&client, &event)
            .await
            .unwrap();

        assert_eq!(
            client.labels(),
            vec![("octo/hello".to_string(), 12, vec!["enhancement".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_label_failure_is_returned() {
        let client = FakeRepoClient::new().failing_labels();
        let event = issue_opened_event(12, Some(3));

        let err = LabelHandler::default()
            .handle_issue_opened(&client, &event)
            .await
            .unwrap_err();
        assert!(matches!(err, DrFillError::Upstream(_)));
    }
}

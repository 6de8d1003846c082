//! Event handlers: the repository mutations Doctor Fill performs.
//!
//! Handlers only ever see a client scoped to the event's installation and a
//! payload parsed from a verified body.

pub mod content;
pub mod label;

pub use content::*;
pub use label::*;

use std::fmt;

use async_trait::async_trait;

use crate::error::{DrFillError, Result};
use crate::github::RepoClient;
use crate::webhook::{IssuesEvent, PushEvent};

#[async_trait]
pub trait PushHandler: Send + Sync {
    async fn handle_push(&self, client: &dyn RepoClient, event: &PushEvent) -> BatchReport;
}

#[async_trait]
pub trait IssuesHandler: Send + Sync {
    async fn handle_issue_opened(&self, client: &dyn RepoClient, event: &IssuesEvent) -> Result<()>;
}

/// Outcome of handling one item (a file, an issue).
#[derive(Debug)]
pub enum ItemOutcome {
    Updated,
    Unchanged,
    Failed(DrFillError),
}

/// Per-item outcomes for one event. One failed item never stops the others.
#[derive(Debug, Default)]
pub struct BatchReport {
    items: Vec<(String, ItemOutcome)>,
}

impl BatchReport {
    pub fn push(&mut self, item: impl Into<String>, outcome: ItemOutcome) {
        self.items.push((item.into(), outcome));
    }

    pub fn items(&self) -> &[(String, ItemOutcome)] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Updated))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed(_)))
    }

    fn count(&self, f: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|(_, o)| f(o)).count()
    }

    /// Logs every failed item.
    pub fn log_failures(&self) {
        for (item, outcome) in &self.items {
            if let ItemOutcome::Failed(e) = outcome {
                tracing::warn!("Failed to process {}: {}", item, e);
            }
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items, {} updated, {} failed",
            self.items.len(),
            self.updated(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        assert!(report.is_empty());

        report.push("a.py", ItemOutcome::Updated);
        report.push("b.py", ItemOutcome::Failed(DrFillError::Upstream("409".into())));
        report.push("c.py", ItemOutcome::Unchanged);

        assert_eq!(report.updated(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.to_string(), "3 items, 1 updated, 1 failed");
    }
}

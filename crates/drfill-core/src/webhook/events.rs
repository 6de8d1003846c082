//! Typed webhook events.

use serde::Deserialize;

use super::envelope::VerifiedEnvelope;
use crate::error::{DrFillError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub added: Vec<String>,
}

/// A `push` event. Push payloads carry no `action`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub commits: Vec<Commit>,
    pub repository: Repository,
    pub installation: Option<Installation>,
}

impl PushEvent {
    /// The branch name when the ref is a branch (`refs/heads/<name>`).
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }

    /// Paths added across all commits, in commit order.
    pub fn added_files(&self) -> impl Iterator<Item = &str> {
        self.commits
            .iter()
            .flat_map(|commit| commit.added.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
}

/// An `issues` event.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
    pub installation: Option<Installation>,
}

#[derive(Deserialize)]
struct ActionOnly {
    action: Option<String>,
}

/// The events Doctor Fill acts on, keyed by `(event type, action)`.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Push(PushEvent),
    IssueOpened(IssuesEvent),
    /// Any other event. Accepted and not acted on.
    Ignored {
        event_type: String,
        action: Option<String>,
    },
}

impl WebhookEvent {
    /// Parses the verified body according to its event type.
    pub fn parse(envelope: &VerifiedEnvelope) -> Result<Self> {
        let body = envelope.body();

        match envelope.event_type() {
            "push" => Ok(WebhookEvent::Push(parse_payload(body, "push")?)),
            event_type => {
                // Events we ignore are not required to carry an object body.
                let action = serde_json::from_slice::<ActionOnly>(body)
                    .ok()
                    .and_then(|a| a.action);

                match (event_type, action.as_deref()) {
                    ("issues", Some("opened")) => {
                        Ok(WebhookEvent::IssueOpened(parse_payload(body, "issues")?))
                    }
                    _ => Ok(WebhookEvent::Ignored {
                        event_type: event_type.to_string(),
                        action,
                    }),
                }
            }
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::Push(_) => "push",
            WebhookEvent::IssueOpened(_) => "issues",
            WebhookEvent::Ignored { event_type, .. } => event_type,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            WebhookEvent::Push(_) => None,
            WebhookEvent::IssueOpened(event) => Some(&event.action),
            WebhookEvent::Ignored { action, .. } => action.as_deref(),
        }
    }

    /// The installation the event belongs to, if it names one.
    pub fn installation_id(&self) -> Option<i64> {
        match self {
            WebhookEvent::Push(event) => event.installation.as_ref().map(|i| i.id),
            WebhookEvent::IssueOpened(event) => event.installation.as_ref().map(|i| i.id),
            WebhookEvent::Ignored { .. } => None,
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(body: &[u8], event_type: &str) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        DrFillError::InvalidPayload(format!("Malformed {} payload: {}", event_type, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::verified_envelope;
    use serde_json::json;

    #[test]
    fn test_parse_push() {
        let body = json!({
            "ref": "refs/heads/main",
            "commits": [
                {"id": "a1", "added": ["src/app.py", "README.md"]},
                {"id": "b2", "added": ["lib/util.go"]}
            ],
            "repository": {"full_name": "octo/hello"},
            "installation": {"id": 99}
        });

        let event = WebhookEvent::parse(&verified_envelope("push", &body)).unwrap();
        let WebhookEvent::Push(push) = &event else {
            panic!("expected push, got {event:?}");
        };

        assert_eq!(push.branch(), Some("main"));
        assert_eq!(
            push.added_files().collect::<Vec<_>>(),
            vec!["src/app.py", "README.md", "lib/util.go"]
        );
        assert_eq!(event.installation_id(), Some(99));
        assert_eq!(event.action(), None);
    }

    #[test]
    fn test_push_tag_ref_has_no_branch() {
        let body = json!({
            "ref": "refs/tags/v1.0",
            "repository": {"full_name": "octo/hello"},
            "installation": {"id": 1}
        });

        let WebhookEvent::Push(push) = WebhookEvent::parse(&verified_envelope("push", &body)).unwrap()
        else {
            panic!("expected push");
        };
        assert_eq!(push.branch(), None);
        assert_eq!(push.added_files().count(), 0);
    }

    #[test]
    fn test_parse_issue_opened() {
        let body = json!({
            "action": "opened",
            "issue": {"number": 7},
            "repository": {"full_name": "octo/hello"},
            "installation": {"id": 5}
        });

        let event = WebhookEvent::parse(&verified_envelope("issues", &body)).unwrap();
        assert!(matches!(&event, WebhookEvent::IssueOpened(e) if e.issue.number == 7));
        assert_eq!(event.installation_id(), Some(5));
        assert_eq!(event.action(), Some("opened"));
    }

    #[test]
    fn test_other_issue_actions_are_ignored() {
        let body = json!({"action": "closed", "issue": {"number": 7}});

        let event = WebhookEvent::parse(&verified_envelope("issues", &body)).unwrap();
        assert!(matches!(
            event,
            WebhookEvent::Ignored { ref event_type, ref action }
                if event_type == "issues" && action.as_deref() == Some("closed")
        ));
    }

    #[test]
    fn test_ping_is_ignored() {
        let body = json!({"zen": "Keep it logically awesome.", "hook_id": 1});

        let event = WebhookEvent::parse(&verified_envelope("ping", &body)).unwrap();
        assert!(matches!(event, WebhookEvent::Ignored { .. }));
        assert_eq!(event.event_type(), "ping");
        assert_eq!(event.installation_id(), None);
    }

    #[test]
    fn test_malformed_push_is_invalid_payload() {
        let body = json!({"ref": "refs/heads/main"});

        let err = WebhookEvent::parse(&verified_envelope("push", &body)).unwrap_err();
        assert!(matches!(err, DrFillError::InvalidPayload(_)));
    }

    #[test]
    fn test_opened_issue_without_number_is_invalid_payload() {
        let body = json!({"action": "opened", "repository": {"full_name": "octo/hello"}});

        let err = WebhookEvent::parse(&verified_envelope("issues", &body)).unwrap_err();
        assert!(matches!(err, DrFillError::InvalidPayload(_)));
    }
}

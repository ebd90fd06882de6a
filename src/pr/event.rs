use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::types::{PullRequestSummary, RepoRef};
use super::GitHubError;

/// Pull request actions that should produce a poster.
pub const HANDLED_ACTIONS: [&str; 4] = ["opened", "reopened", "synchronize", "ready_for_review"];

/// Events whose payload carries the whole pull request.
pub const PULL_REQUEST_EVENTS: [&str; 2] = ["pull_request", "pull_request_target"];

/// Events that only point at a pull request, which then has to be fetched.
pub const LOOKUP_EVENTS: [&str; 2] = ["issue_comment", "workflow_run"];

/// The pull request an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    pub repo: RepoRef,
    pub pr_number: u64,
}

/// What to do with one delivery.
#[derive(Debug, Clone)]
pub enum EventSource {
    /// Nothing to do; carries a short description for the log.
    Ignored(String),
    /// The payload already holds the pull request.
    Direct(PullRequestEvent),
    /// The pull request must be fetched before handling.
    Lookup(EventTarget),
}

/// Read a payload file as delivered by the runner.
pub fn read_payload(path: &Path) -> Result<String, GitHubError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Decide how to handle a delivery from its event name and raw payload.
pub fn classify_event(event_name: &str, raw: &str) -> Result<EventSource, GitHubError> {
    if PULL_REQUEST_EVENTS.contains(&event_name) {
        let event = PullRequestEvent::from_json(raw)?;
        if event.is_handled_action() {
            return Ok(EventSource::Direct(event));
        }
        return Ok(EventSource::Ignored(format!("{} action {}", event_name, event.action)));
    }

    if LOOKUP_EVENTS.contains(&event_name) {
        let payload: Value = serde_json::from_str(raw)?;
        return Ok(match infer_target(&payload) {
            Some(target) => EventSource::Lookup(target),
            None => EventSource::Ignored(format!("{} event without a pull request", event_name)),
        });
    }

    Ok(EventSource::Ignored(format!("{} event", event_name)))
}

/// Find the repository and PR number in a `pull_request`, `issue_comment`
/// (on a PR) or `workflow_run` payload. The first PR of a workflow run wins.
pub fn infer_target(payload: &Value) -> Option<EventTarget> {
    let str_at = |pointer: &str| payload.pointer(pointer).and_then(Value::as_str);
    let number_at = |pointer: &str| payload.pointer(pointer).and_then(Value::as_u64);

    let mut repo = str_at("/repository/full_name");
    let pr_number = if payload.get("pull_request").is_some() {
        number_at("/pull_request/number")
    } else if payload
        .pointer("/issue/pull_request")
        .is_some_and(|v| !v.is_null())
    {
        number_at("/issue/number")
    } else if let Some(number) = number_at("/workflow_run/pull_requests/0/number") {
        repo = repo.or_else(|| str_at("/workflow_run/repository/full_name"));
        Some(number)
    } else {
        None
    };

    Some(EventTarget {
        repo: RepoRef::parse(repo?)?,
        pr_number: pr_number?,
    })
}

/// The subset of a `pull_request` webhook delivery we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub repository: Repository,
    pub pull_request: PullRequestPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub user: Option<PayloadUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadUser {
    #[serde(default)]
    pub login: Option<String>,
}

impl PullRequestEvent {
    pub fn from_json(raw: &str) -> Result<Self, GitHubError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Assemble an event for a pull request fetched from the API.
    pub fn for_target(action: &str, target: &EventTarget, pull_request: PullRequestPayload) -> Self {
        Self {
            action: action.to_string(),
            repository: Repository {
                name: target.repo.repo.clone(),
                full_name: target.repo.to_string(),
                owner: Account {
                    login: target.repo.owner.clone(),
                },
            },
            pull_request,
        }
    }

    pub fn is_handled_action(&self) -> bool {
        HANDLED_ACTIONS.contains(&self.action.as_str())
    }

    pub fn repo_ref(&self) -> RepoRef {
        RepoRef {
            owner: self.repository.owner.login.clone(),
            repo: self.repository.name.clone(),
        }
    }

    pub fn summary(&self) -> PullRequestSummary {
        let pr = &self.pull_request;
        PullRequestSummary {
            number: pr.number,
            title: pr.title.clone(),
            body: pr.body.clone(),
            html_url: pr.html_url.clone(),
            author: pr.user.as_ref().and_then(|u| u.login.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENED: &str = r#"{
        "action": "opened",
        "number": 7,
        "pull_request": {
            "number": 7,
            "title": "Add poster bot",
            "body": null,
            "html_url": "https://github.com/octo/hello/pull/7",
            "user": { "login": "alice", "id": 1 },
            "draft": false
        },
        "repository": {
            "name": "hello",
            "full_name": "octo/hello",
            "owner": { "login": "octo" }
        },
        "sender": { "login": "alice" }
    }"#;

    #[test]
    fn test_parse_opened_event() {
        let event = PullRequestEvent::from_json(OPENED).unwrap();
        assert!(event.is_handled_action());
        assert_eq!(event.repository.full_name, "octo/hello");
        assert_eq!(event.repo_ref().to_string(), "octo/hello");

        let summary = event.summary();
        assert_eq!(summary.number, 7);
        assert_eq!(summary.title, "Add poster bot");
        assert!(summary.body.is_none());
        assert_eq!(summary.author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_closed_action_not_handled() {
        let raw = OPENED.replace("\"opened\"", "\"closed\"");
        let event = PullRequestEvent::from_json(&raw).unwrap();
        assert!(!event.is_handled_action());
    }

    #[test]
    fn test_invalid_payload() {
        assert!(PullRequestEvent::from_json("{\"action\": \"opened\"}").is_err());
    }

    fn target(payload: Value) -> Option<EventTarget> {
        infer_target(&payload)
    }

    #[test]
    fn test_infer_from_pull_request() {
        let payload: Value = serde_json::from_str(OPENED).unwrap();
        let found = infer_target(&payload).unwrap();
        assert_eq!(found.repo.to_string(), "octo/hello");
        assert_eq!(found.pr_number, 7);
    }

    #[test]
    fn test_infer_from_issue_comment_on_pr() {
        let found = target(serde_json::json!({
            "action": "created",
            "issue": { "number": 12, "pull_request": { "url": "https://api.github.com/repos/octo/hello/pulls/12" } },
            "repository": { "full_name": "octo/hello" }
        }))
        .unwrap();
        assert_eq!(found.pr_number, 12);
    }

    #[test]
    fn test_plain_issue_comment_has_no_target() {
        assert!(target(serde_json::json!({
            "issue": { "number": 12 },
            "repository": { "full_name": "octo/hello" }
        }))
        .is_none());
        assert!(target(serde_json::json!({
            "issue": { "number": 12, "pull_request": null },
            "repository": { "full_name": "octo/hello" }
        }))
        .is_none());
    }

    #[test]
    fn test_infer_from_workflow_run() {
        let found = target(serde_json::json!({
            "workflow_run": {
                "pull_requests": [{ "number": 3 }, { "number": 4 }],
                "repository": { "full_name": "octo/fork" }
            }
        }))
        .unwrap();
        assert_eq!(found.repo.to_string(), "octo/fork");
        assert_eq!(found.pr_number, 3);

        let found = target(serde_json::json!({
            "workflow_run": {
                "pull_requests": [{ "number": 3 }],
                "repository": { "full_name": "octo/fork" }
            },
            "repository": { "full_name": "octo/hello" }
        }))
        .unwrap();
        assert_eq!(found.repo.to_string(), "octo/hello");
    }

    #[test]
    fn test_workflow_run_without_prs_has_no_target() {
        assert!(target(serde_json::json!({
            "workflow_run": { "pull_requests": [] },
            "repository": { "full_name": "octo/hello" }
        }))
        .is_none());
    }

    #[test]
    fn test_classify_event() {
        assert!(matches!(
            classify_event("pull_request", OPENED).unwrap(),
            EventSource::Direct(e) if e.pull_request.number == 7
        ));
        assert!(matches!(
            classify_event("pull_request_target", OPENED).unwrap(),
            EventSource::Direct(_)
        ));

        let closed = OPENED.replace("\"opened\"", "\"closed\"");
        assert!(matches!(
            classify_event("pull_request", &closed).unwrap(),
            EventSource::Ignored(_)
        ));

        let comment = r#"{"issue": {"number": 9, "pull_request": {}}, "repository": {"full_name": "octo/hello"}}"#;
        match classify_event("issue_comment", comment).unwrap() {
            EventSource::Lookup(found) => assert_eq!(found.pr_number, 9),
            other => panic!("expected lookup, got {:?}", other),
        }

        assert!(matches!(
            classify_event("push", "not even json").unwrap(),
            EventSource::Ignored(_)
        ));
        assert!(classify_event("workflow_run", "not json").is_err());
    }

    #[test]
    fn test_for_target_builds_repository() {
        let found = EventTarget {
            repo: RepoRef::parse("octo/hello").unwrap(),
            pr_number: 5,
        };
        let pr = PullRequestPayload {
            number: 5,
            title: "Fix".to_string(),
            body: None,
            html_url: None,
            user: None,
        };
        let event = PullRequestEvent::for_target("created", &found, pr);
        assert_eq!(event.repository.full_name, "octo/hello");
        assert_eq!(event.repo_ref(), found.repo);
        assert_eq!(event.summary().number, 5);
    }
}

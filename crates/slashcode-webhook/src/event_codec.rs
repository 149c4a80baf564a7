use slashcode_core::{AuthorKind, EntityKind, EventKind, IntakeEvent, PrState};
use thiserror::Error;

use crate::payload::RawWebhookPayload;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("webhook payload is missing repository.full_name (and owner/name)")]
    MissingRepo,
    #[error("issue_comment payload is missing the 'issue' object")]
    MissingIssue,
    #[error("pull_request_review_comment payload is missing the 'pull_request' object")]
    MissingPullRequest,
}

/// One accepted webhook, decoded but not yet admission-filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub action: String,
    pub event: IntakeEvent,
}

/// Decodes a raw webhook body given the `X-GitHub-Event` header value.
///
/// Returns `Ok(None)` for any event type other than `issue_comment` and
/// `pull_request_review_comment` — per `spec.md` §4.1, unknown event types
/// are acknowledged with 200 and no side effect, not treated as an error.
pub fn decode_event(
    event_header: &str,
    body: &[u8],
) -> Result<Option<DecodedEvent>, EventDecodeError> {
    let kind = match event_header {
        "issue_comment" => EventKind::IssueComment,
        "pull_request_review_comment" => EventKind::ReviewComment,
        _ => return Ok(None),
    };

    let payload: RawWebhookPayload =
        serde_json::from_slice(body).map_err(|err| EventDecodeError::MalformedBody(err.to_string()))?;

    let repo = payload
        .repository
        .repo_full_name()
        .ok_or(EventDecodeError::MissingRepo)?;
    let default_branch = payload.repository.default_branch.clone();
    let action = payload.action.clone().unwrap_or_default();

    let author_kind = if payload.comment.user.kind.eq_ignore_ascii_case("bot") {
        AuthorKind::Bot
    } else {
        AuthorKind::User
    };

    let event = match kind {
        EventKind::IssueComment => {
            let issue = payload.issue.as_ref().ok_or(EventDecodeError::MissingIssue)?;
            let entity_kind = if issue.pull_request.is_some() {
                EntityKind::Pr
            } else {
                EntityKind::Issue
            };
            let pr_state = (entity_kind == EntityKind::Pr).then(|| parse_pr_state(&issue.state));
            IntakeEvent {
                kind,
                repo,
                number: issue.number,
                entity_kind,
                pr_state,
                pr_head_branch: None,
                pr_base_branch: None,
                default_branch,
                comment_id: payload.comment.id,
                comment_body: payload.comment.body.clone(),
                author_login: payload.comment.user.login.clone(),
                author_kind,
                entity_title: issue.title.clone(),
                entity_body: issue.body.clone().unwrap_or_default(),
            }
        }
        EventKind::ReviewComment => {
            let pull_request = payload
                .pull_request
                .as_ref()
                .ok_or(EventDecodeError::MissingPullRequest)?;
            IntakeEvent {
                kind,
                repo,
                number: pull_request.number,
                entity_kind: EntityKind::Pr,
                pr_state: Some(parse_pr_state(&pull_request.state)),
                pr_head_branch: Some(pull_request.head.ref_name.clone()),
                pr_base_branch: Some(pull_request.base.ref_name.clone()),
                default_branch,
                comment_id: payload.comment.id,
                comment_body: payload.comment.body.clone(),
                author_login: payload.comment.user.login.clone(),
                author_kind,
                entity_title: pull_request.title.clone(),
                entity_body: pull_request.body.clone().unwrap_or_default(),
            }
        }
    };

    Ok(Some(DecodedEvent { action, event }))
}

fn parse_pr_state(raw: &str) -> PrState {
    if raw.eq_ignore_ascii_case("closed") {
        PrState::Closed
    } else {
        PrState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_comment_body(pull_request_marker: bool) -> serde_json::Value {
        serde_json::json!({
            "action": "created",
            "issue": {
                "number": 42,
                "title": "Something broke",
                "body": "details",
                "state": "open",
                "pull_request": if pull_request_marker { serde_json::json!({}) } else { serde_json::Value::Null },
            },
            "comment": {
                "id": 99,
                "body": "/code fix it",
                "user": {"login": "alice", "type": "User"},
            },
            "repository": {
                "full_name": "owner/repo",
                "default_branch": "main",
                "owner": {"login": "owner"},
                "name": "repo",
            },
        })
    }

    #[test]
    fn unit_decode_event_returns_none_for_unknown_event_header() {
        let body = serde_json::to_vec(&issue_comment_body(false)).unwrap();
        assert_eq!(decode_event("ping", &body).unwrap(), None);
    }

    #[test]
    fn functional_decode_event_marks_entity_as_pr_when_issue_has_pull_request_key() {
        let body = serde_json::to_vec(&issue_comment_body(true)).unwrap();
        let decoded = decode_event("issue_comment", &body).unwrap().unwrap();
        assert_eq!(decoded.event.entity_kind, EntityKind::Pr);
        assert_eq!(decoded.event.pr_state, Some(PrState::Open));
        assert_eq!(decoded.event.pr_head_branch, None);
    }

    #[test]
    fn functional_decode_event_marks_entity_as_issue_when_pull_request_key_absent() {
        let body = serde_json::to_vec(&issue_comment_body(false)).unwrap();
        let decoded = decode_event("issue_comment", &body).unwrap().unwrap();
        assert_eq!(decoded.event.entity_kind, EntityKind::Issue);
        assert_eq!(decoded.event.pr_state, None);
    }

    #[test]
    fn integration_decode_event_review_comment_captures_base_and_head_branches() {
        let body = serde_json::json!({
            "action": "created",
            "pull_request": {
                "number": 7,
                "title": "Add feature",
                "body": "why",
                "state": "open",
                "base": {"ref": "main"},
                "head": {"ref": "feature/x"},
            },
            "comment": {
                "id": 501,
                "body": "/code please review",
                "user": {"login": "bob", "type": "User"},
            },
            "repository": {
                "full_name": "owner/repo",
                "default_branch": "main",
            },
        });
        let body = serde_json::to_vec(&body).unwrap();
        let decoded = decode_event("pull_request_review_comment", &body)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.event.entity_kind, EntityKind::Pr);
        assert_eq!(decoded.event.pr_head_branch.as_deref(), Some("feature/x"));
        assert_eq!(decoded.event.pr_base_branch.as_deref(), Some("main"));
        assert_eq!(decoded.action, "created");
    }

    #[test]
    fn regression_decode_event_rejects_malformed_json_body() {
        let err = decode_event("issue_comment", b"not json").unwrap_err();
        assert!(matches!(err, EventDecodeError::MalformedBody(_)));
    }

    #[test]
    fn regression_decode_event_falls_back_to_owner_and_name_when_full_name_missing() {
        let body = serde_json::json!({
            "action": "created",
            "issue": {"number": 1, "title": "t", "body": "b", "state": "open"},
            "comment": {"id": 1, "body": "/code", "user": {"login": "a", "type": "User"}},
            "repository": {"default_branch": "main", "owner": {"login": "owner"}, "name": "repo"},
        });
        let body = serde_json::to_vec(&body).unwrap();
        let decoded = decode_event("issue_comment", &body).unwrap().unwrap();
        assert_eq!(decoded.event.repo, "owner/repo");
    }

    #[test]
    fn regression_decode_event_bot_author_is_classified_as_bot() {
        let mut payload = issue_comment_body(false);
        payload["comment"]["user"]["type"] = serde_json::json!("Bot");
        let body = serde_json::to_vec(&payload).unwrap();
        let decoded = decode_event("issue_comment", &body).unwrap().unwrap();
        assert_eq!(decoded.event.author_kind, AuthorKind::Bot);
    }
}

//! Webhook payload parsing and dispatch (§6 "Webhook front door").
//!
//! Grounded on `original_source/webhook.py`'s comment-created event filter
//! and async task dispatch; the teacher's `bin/webhook_gateway.rs` stub
//! contributed the axum skeleton this sits behind (`bin/webhook.rs`), but
//! had no payload parsing at all — it only served `/health`.

use serde::Deserialize;

const TRIGGER_COMMENT: &str = "/implement";

/// The subset of a work-tracker webhook payload this agent cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub action: String,
    pub comment: Option<CommentPayload>,
    pub issue: Option<IssuePayload>,
    pub repository: Option<RepositoryPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub owner: String,
    pub name: String,
}

/// A fully resolved dispatch request: enough to clone the repo, fetch the
/// issue, and run a task against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

/// Whether `payload` is a "comment created" event whose body is exactly
/// the trigger comment, and if so, what task it should dispatch. Returns
/// `None` for any other event shape — including edits/deletions of the
/// trigger comment, which must not re-fire a task.
pub fn parse_trigger(payload: &WebhookPayload) -> Option<DispatchRequest> {
    if payload.action != "created" {
        return None;
    }
    let comment = payload.comment.as_ref()?;
    if comment.body.trim() != TRIGGER_COMMENT {
        return None;
    }
    let issue = payload.issue.as_ref()?;
    let repository = payload.repository.as_ref()?;
    Some(DispatchRequest {
        owner: repository.owner.clone(),
        repo: repository.name.clone(),
        issue_number: issue.number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(action: &str, body: &str) -> WebhookPayload {
        serde_json::from_value(json!({
            "action": action,
            "comment": { "body": body },
            "issue": { "number": 42 },
            "repository": { "owner": "acme", "name": "widgets" }
        }))
        .unwrap()
    }

    #[test]
    fn trigger_comment_dispatches() {
        let request = parse_trigger(&payload("created", "/implement")).unwrap();
        assert_eq!(request, DispatchRequest { owner: "acme".into(), repo: "widgets".into(), issue_number: 42 });
    }

    #[test]
    fn non_trigger_comment_is_ignored() {
        assert!(parse_trigger(&payload("created", "looks good to me")).is_none());
    }

    #[test]
    fn edited_trigger_comment_does_not_redispatch() {
        assert!(parse_trigger(&payload("edited", "/implement")).is_none());
    }

    #[test]
    fn trigger_comment_tolerates_surrounding_whitespace() {
        assert!(parse_trigger(&payload("created", "  /implement  \n")).is_some());
    }
}

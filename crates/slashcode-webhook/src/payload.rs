use serde::Deserialize;
use serde_json::Value;

/// Raw wire shape shared by both accepted event types. Fields absent for a
/// given event kind are simply left `None` and never read for that kind —
/// see `decode_event` in `event_codec`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawWebhookPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<RawIssue>,
    #[serde(default)]
    pub pull_request: Option<RawPullRequest>,
    pub comment: RawComment,
    pub repository: RawRepository,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawIssue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    /// Presence (even as `null`) marks the issue as a pull request.
    #[serde(default)]
    pub pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    pub base: RawBranchRef,
    pub head: RawBranchRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: RawUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRepository {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub owner: Option<RawOwner>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawOwner {
    pub login: String,
}

impl RawRepository {
    pub(crate) fn repo_full_name(&self) -> Option<String> {
        if let Some(full_name) = &self.full_name {
            if !full_name.is_empty() {
                return Some(full_name.clone());
            }
        }
        match (&self.owner, &self.name) {
            (Some(owner), Some(name)) if !owner.login.is_empty() && !name.is_empty() => {
                Some(format!("{}/{}", owner.login, name))
            }
            _ => None,
        }
    }
}

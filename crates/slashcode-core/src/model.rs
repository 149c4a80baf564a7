use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Which of the two accepted webhook shapes an `IntakeEvent` was decoded from.
pub enum EventKind {
    IssueComment,
    ReviewComment,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IssueComment => "issue_comment",
            Self::ReviewComment => "pull_request_review_comment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Whether the triggering entity is an issue or a pull request.
pub enum EntityKind {
    Issue,
    Pr,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    User,
    Bot,
}

/// Normalized, request-scoped view of one accepted webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntakeEvent {
    pub kind: EventKind,
    pub repo: String,
    pub number: u64,
    pub entity_kind: EntityKind,
    pub pr_state: Option<PrState>,
    pub pr_head_branch: Option<String>,
    pub pr_base_branch: Option<String>,
    pub default_branch: String,
    pub comment_id: u64,
    pub comment_body: String,
    pub author_login: String,
    pub author_kind: AuthorKind,
    pub entity_title: String,
    pub entity_body: String,
}

/// The unit the dispatcher serializes and retries.
///
/// Invariants: `repo` is non-empty, `number > 0`, `attempt` starts at 1 and
/// is mutated only by the dispatcher, `raw_body` is preserved byte-for-byte
/// from the originating webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub task_id: String,
    pub repo: String,
    pub number: u64,
    pub entity_kind: EntityKind,
    pub base_branch: String,
    pub pr_branch: Option<String>,
    pub pr_state: Option<PrState>,
    pub trigger_username: String,
    pub event_kind: EventKind,
    #[serde(with = "raw_body_b64")]
    pub raw_body: Vec<u8>,
    pub prompt: String,
    pub prompt_summary: String,
    pub attempt: u32,
}

impl Task {
    /// `"{repo}#{number}"` key used by the dispatcher's keyed mutex table
    /// and by log correlation.
    pub fn entity_key(&self) -> String {
        format!("{}#{}", self.repo, self.number)
    }
}

mod raw_body_b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Execution status of a `JournalEntry`. Transitions must follow
/// `Pending -> Running -> (Completed | Failed)`; once terminal, no further
/// status writes are permitted (log appends remain allowed).
pub enum JournalStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JournalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true when `self -> next` is an allowed transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use JournalStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Error,
    Success,
    Hint,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub message: String,
}

/// Per-task execution record owned by the journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub task_id: String,
    pub owner: String,
    pub name: String,
    pub number: u64,
    pub trigger_actor: String,
    pub status: JournalStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub tracking_comment_id: Option<u64>,
    pub log: Vec<LogRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_task_entity_key_formats_repo_and_number() {
        let task = Task {
            task_id: "task-1".into(),
            repo: "owner/name".into(),
            number: 42,
            entity_kind: EntityKind::Issue,
            base_branch: "main".into(),
            pr_branch: None,
            pr_state: None,
            trigger_username: "alice".into(),
            event_kind: EventKind::IssueComment,
            raw_body: vec![1, 2, 3],
            prompt: String::new(),
            prompt_summary: String::new(),
            attempt: 1,
        };
        assert_eq!(task.entity_key(), "owner/name#42");
    }

    #[test]
    fn unit_task_round_trips_through_json_with_binary_raw_body() {
        let task = Task {
            task_id: "task-1".into(),
            repo: "owner/name".into(),
            number: 1,
            entity_kind: EntityKind::Pr,
            base_branch: "main".into(),
            pr_branch: Some("feature".into()),
            pr_state: Some(PrState::Open),
            trigger_username: "alice".into(),
            event_kind: EventKind::ReviewComment,
            raw_body: vec![0, 255, 10, 13, 200],
            prompt: "do the thing".into(),
            prompt_summary: "**PR:** title".into(),
            attempt: 2,
        };
        let encoded = serde_json::to_string(&task).expect("encode");
        let decoded: Task = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, task);
    }

    #[test]
    fn functional_journal_status_transitions_follow_pending_running_terminal() {
        assert!(JournalStatus::Pending.can_transition_to(JournalStatus::Running));
        assert!(JournalStatus::Running.can_transition_to(JournalStatus::Completed));
        assert!(JournalStatus::Running.can_transition_to(JournalStatus::Failed));
        assert!(!JournalStatus::Completed.can_transition_to(JournalStatus::Running));
        assert!(!JournalStatus::Failed.can_transition_to(JournalStatus::Pending));
        assert!(JournalStatus::Completed.is_terminal());
        assert!(JournalStatus::Failed.is_terminal());
        assert!(!JournalStatus::Running.is_terminal());
    }
}

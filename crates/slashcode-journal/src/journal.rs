use std::collections::HashMap;
use std::sync::Mutex;

use slashcode_core::{current_unix_timestamp_ms, JournalEntry, JournalStatus, LogLevel, LogRecord, Task};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("no journal entry for task {0}")]
    NotFound(String),
    #[error("invalid status transition for task {task_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        task_id: String,
        from: JournalStatus,
        to: JournalStatus,
    },
}

/// In-memory map from task id to journal entry, guarded by a single mutex
/// held only long enough to copy data in or out (Design Note 9: "the three
/// [shared states] are guarded by an internal mutex over their backing map;
/// operations are short and copy data out").
///
/// Lost on process restart by design — `spec.md` §1 Non-goals.
pub struct TaskJournal {
    entries: Mutex<HashMap<String, JournalEntry>>,
}

impl Default for TaskJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskJournal {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a new entry in `Pending` status with one `"Task queued"` log
    /// record. Called once by the intake handler per admitted task.
    pub fn create(&self, task: &Task, owner: &str, name: &str) -> JournalEntry {
        let now = current_unix_timestamp_ms();
        let entry = JournalEntry {
            task_id: task.task_id.clone(),
            owner: owner.to_string(),
            name: name.to_string(),
            number: task.number,
            trigger_actor: task.trigger_username.clone(),
            status: JournalStatus::Pending,
            created_at_ms: now,
            updated_at_ms: now,
            tracking_comment_id: None,
            log: vec![LogRecord {
                timestamp_ms: now,
                level: LogLevel::Info,
                message: "Task queued".to_string(),
            }],
        };
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        guard.insert(entry.task_id.clone(), entry.clone());
        debug!(task_id = %entry.task_id, "journal entry created");
        entry
    }

    pub fn get(&self, task_id: &str) -> Option<JournalEntry> {
        let guard = self.entries.lock().expect("journal mutex poisoned");
        guard.get(task_id).cloned()
    }

    /// Newest-first by creation time.
    pub fn list(&self) -> Vec<JournalEntry> {
        let guard = self.entries.lock().expect("journal mutex poisoned");
        let mut entries: Vec<JournalEntry> = guard.values().cloned().collect();
        entries.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        entries
    }

    /// Transitions a task's status. Rejects transitions that do not follow
    /// `Pending -> Running -> (Completed | Failed)`, and rejects any write
    /// once the entry is already terminal.
    pub fn update_status(&self, task_id: &str, next: JournalStatus) -> Result<(), JournalError> {
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        let entry = guard
            .get_mut(task_id)
            .ok_or_else(|| JournalError::NotFound(task_id.to_string()))?;
        if !entry.status.can_transition_to(next) {
            warn!(task_id, from = ?entry.status, to = ?next, "rejected invalid journal transition");
            return Err(JournalError::InvalidTransition {
                task_id: task_id.to_string(),
                from: entry.status,
                to: next,
            });
        }
        entry.status = next;
        entry.updated_at_ms = current_unix_timestamp_ms();
        Ok(())
    }

    /// Appends a log record. Permitted in any status, including terminal
    /// ones, per `spec.md` §4.5.
    pub fn add_log(&self, task_id: &str, level: LogLevel, message: impl Into<String>) -> Result<(), JournalError> {
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        let entry = guard
            .get_mut(task_id)
            .ok_or_else(|| JournalError::NotFound(task_id.to_string()))?;
        entry.log.push(LogRecord {
            timestamp_ms: current_unix_timestamp_ms(),
            level,
            message: message.into(),
        });
        entry.updated_at_ms = current_unix_timestamp_ms();
        Ok(())
    }

    pub fn set_tracking_comment(&self, task_id: &str, comment_id: u64) -> Result<(), JournalError> {
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        let entry = guard
            .get_mut(task_id)
            .ok_or_else(|| JournalError::NotFound(task_id.to_string()))?;
        entry.tracking_comment_id = Some(comment_id);
        Ok(())
    }

    /// Marks every still-`Pending` entry for `(owner, name, number)` other
    /// than `except_task_id` as `Failed`, with a log line noting the
    /// supersession. Lets a newer trigger comment cancel queued-but-not-yet-
    /// started work. Returns the number of entries superseded.
    pub fn supersede_older(&self, owner: &str, name: &str, number: u64, except_task_id: &str) -> usize {
        let now = current_unix_timestamp_ms();
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        let mut superseded = 0usize;
        for entry in guard.values_mut() {
            if entry.owner == owner
                && entry.name == name
                && entry.number == number
                && entry.task_id != except_task_id
                && entry.status == JournalStatus::Pending
            {
                entry.status = JournalStatus::Failed;
                entry.updated_at_ms = now;
                entry.log.push(LogRecord {
                    timestamp_ms: now,
                    level: LogLevel::Info,
                    message: "Superseded by newer /code comment".to_string(),
                });
                superseded += 1;
            }
        }
        superseded
    }
}

use slashcode_contract::AuthProvider;
use slashcode_core::{next_task_id, JournalStatus, LogLevel, Task};
use slashcode_dispatch::{Dispatcher, EnqueueError};
use slashcode_journal::{DedupTable, TaskJournal};
use slashcode_webhook::{build_prompt_summary, decode_event, extract_prompt, verify_signature};
use tracing::{info, warn};

use crate::response::IntakeResponse;

/// Operator-facing intake tunables (`spec.md` §6 Configuration).
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub trigger_keyword: String,
    pub permission_mode_open: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            trigger_keyword: "/code".to_string(),
            permission_mode_open: false,
        }
    }
}

/// The collaborators the admission pipeline needs for one request. Borrowed,
/// not owned: the caller (the HTTP layer) holds the long-lived `Arc`s.
pub struct IntakeDeps<'a> {
    pub webhook_secret: &'a [u8],
    pub journal: &'a TaskJournal,
    pub dedup: &'a DedupTable,
    pub dispatcher: &'a Dispatcher,
    pub auth: &'a dyn AuthProvider,
    pub config: &'a IntakeConfig,
}

/// Runs the full admission pipeline for one webhook delivery (`spec.md`
/// §4.2, steps 1-9) and returns the HTTP-shaped outcome.
pub async fn handle_webhook(
    deps: &IntakeDeps<'_>,
    signature_header: Option<&str>,
    event_header: &str,
    body: &[u8],
) -> IntakeResponse {
    if let Err(err) = verify_signature(deps.webhook_secret, body, signature_header) {
        warn!(%err, "rejected webhook: signature verification failed");
        return IntakeResponse::new(401, err.to_string());
    }

    let decoded = match decode_event(event_header, body) {
        Ok(Some(decoded)) => decoded,
        Ok(None) => return IntakeResponse::ok_diagnostic("Event ignored"),
        Err(err) => {
            warn!(%err, "rejected webhook: could not decode event");
            return IntakeResponse::new(400, err.to_string());
        }
    };

    if decoded.action != "created" {
        return IntakeResponse::ok_diagnostic("Action ignored");
    }

    let event = decoded.event;

    if event.author_kind == slashcode_core::AuthorKind::Bot {
        return IntakeResponse::ok_diagnostic("Bot comment ignored");
    }

    let prompt = match extract_prompt(&event.comment_body, &deps.config.trigger_keyword) {
        Some(prompt) => prompt,
        None => return IntakeResponse::ok_diagnostic("No trigger keyword found"),
    };

    if !deps.config.permission_mode_open {
        match deps.auth.installation_owner(&event.repo).await {
            Ok(owner) if owner != event.author_login => {
                return IntakeResponse::ok_diagnostic("Permission denied");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%err, repo = %event.repo, "installer lookup failed, failing open");
            }
        }
    }

    if !deps.dedup.mark_if_new(event.comment_id) {
        return IntakeResponse::ok_diagnostic("Duplicate comment ignored");
    }

    let task_id = next_task_id();
    let base_branch = event.pr_base_branch.clone().unwrap_or_else(|| event.default_branch.clone());
    let prompt_summary = build_prompt_summary(event.entity_kind, &event.entity_title, &prompt);
    let prompt = if prompt.is_empty() {
        format!("{}\n\n{}", event.entity_title, event.entity_body)
    } else {
        prompt
    };

    let task = Task {
        task_id,
        repo: event.repo.clone(),
        number: event.number,
        entity_kind: event.entity_kind,
        base_branch,
        pr_branch: event.pr_head_branch.clone(),
        pr_state: event.pr_state,
        trigger_username: event.author_login.clone(),
        event_kind: event.kind,
        raw_body: body.to_vec(),
        prompt,
        prompt_summary: prompt_summary.clone(),
        attempt: 1,
    };

    let (owner, name) = split_repo(&event.repo);
    deps.journal.create(&task, owner, name);
    let superseded = deps.journal.supersede_older(owner, name, event.number, &task.task_id);
    if superseded > 0 {
        info!(repo = %event.repo, number = event.number, superseded, "superseded stale pending tasks");
    }

    let task_id = task.task_id.clone();
    match deps.dispatcher.enqueue(task) {
        Ok(()) => {
            info!(task_id = %task_id, "task accepted");
            IntakeResponse::new(202, format!("Task queued: {prompt_summary}"))
        }
        Err(EnqueueError::QueueFull) | Err(EnqueueError::QueueClosed) => {
            mark_rejected(deps.journal, &task_id);
            IntakeResponse::new(503, "Task queue unavailable")
        }
    }
}

fn split_repo(repo: &str) -> (&str, &str) {
    match repo.split_once('/') {
        Some((owner, name)) => (owner, name),
        None => (repo, ""),
    }
}

/// Marks a previously journaled task as failed when the dispatcher rejected
/// it after admission succeeded (queue full/closed) — kept out of
/// `handle_webhook` because the journal API borrows, and the `Task` is moved
/// into `Dispatcher::enqueue` before a failure is known.
pub fn mark_rejected(journal: &TaskJournal, task_id: &str) {
    let _ = journal.update_status(task_id, JournalStatus::Failed);
    let _ = journal.add_log(task_id, LogLevel::Error, "Task rejected: dispatcher queue unavailable");
}

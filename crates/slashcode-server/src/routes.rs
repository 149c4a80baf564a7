//! HTTP surface: the webhook intake route and a read-only operator route
//! over the journal, following the `tau-gateway` router-over-`Arc<State>`
//! convention (`axum::extract::State`, `HeaderMap`, `Bytes`).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use slashcode_contract::AuthProvider;
use slashcode_core::JournalEntry;
use slashcode_dispatch::Dispatcher;
use slashcode_intake::{handle_webhook, IntakeConfig, IntakeDeps};
use slashcode_journal::{DedupTable, TaskJournal};
use tracing::warn;

const WEBHOOK_ENDPOINT: &str = "/webhook/github";
const TASKS_ENDPOINT: &str = "/tasks";

pub struct AppState {
    pub webhook_secret: Vec<u8>,
    pub journal: Arc<TaskJournal>,
    pub dedup: DedupTable,
    pub dispatcher: Arc<Dispatcher>,
    pub auth: Arc<dyn AuthProvider>,
    pub intake_config: IntakeConfig,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_ENDPOINT, post(handle_webhook_route))
        .route(TASKS_ENDPOINT, get(handle_list_tasks))
        .with_state(state)
}

async fn handle_webhook_route(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|value| value.to_str().ok());
    let event = headers
        .get("X-GitHub-Event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let deps = IntakeDeps {
        webhook_secret: &state.webhook_secret,
        journal: state.journal.as_ref(),
        dedup: &state.dedup,
        dispatcher: state.dispatcher.as_ref(),
        auth: state.auth.as_ref(),
        config: &state.intake_config,
    };

    let outcome = handle_webhook(&deps, signature, event, &body).await;
    let status = StatusCode::from_u16(outcome.status).unwrap_or_else(|err| {
        warn!(status = outcome.status, %err, "intake produced an invalid status code, falling back to 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });
    (status, outcome.body).into_response()
}

/// Read-only listing for operator tooling (`spec.md` §4.5: "read by operator
/// tooling, written by the intake handler, dispatcher, and the executor
/// collaborator").
async fn handle_list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<JournalEntry>> {
    Json(state.journal.list())
}

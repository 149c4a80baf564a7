//! Shared data model, id generation, and time utilities for the slashcode
//! webhook-ingestion and dispatch core.

pub mod ids;
pub mod model;
pub mod time_utils;

pub use ids::next_task_id;
pub use model::{
    AuthorKind, EntityKind, EventKind, IntakeEvent, JournalEntry, JournalStatus, LogLevel,
    LogRecord, PrState, Task,
};
pub use time_utils::{current_unix_timestamp_ms, is_expired_unix_ms};

//! Collaborator interfaces consumed by the ingestion and dispatch core.
//!
//! The code-generation provider, git working-tree manipulator, GitHub REST
//! client, and installation-token minter are deliberately out of scope for
//! this workspace's hard core; they are represented here only by the
//! contracts the core actually calls.

use async_trait::async_trait;
use slashcode_core::Task;
use thiserror::Error;

/// Errors an `AuthProvider` may return while resolving installer identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no installation found for repo {0}")]
    NoInstallation(String),
    #[error("upstream auth provider error: {0}")]
    Upstream(String),
}

/// Resolves the GitHub account that owns a repository's app installation.
///
/// Consumed by the intake handler's authorization step (`spec.md` §4.2 step
/// 5). Errors here are fail-open: the intake handler logs a warning and
/// proceeds rather than rejecting the webhook.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn installation_owner(&self, repo: &str) -> Result<String, AuthError>;

    async fn installation_token(&self, repo: &str) -> Result<InstallationToken, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationToken {
    pub token: String,
    pub expires_unix_ms: u64,
}

/// Successful result of a task execution. Deliberately only a human-readable
/// summary: the dispatcher never inspects richer file-edit detail, so the
/// contract does not carry it (see `spec.md` §9 Open Question).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub summary: String,
}

/// Errors a `TaskExecutor` may return. The dispatcher classifies failures
/// using `is_non_retryable` alone — see `spec.md` §4.4.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskExecutionError {
    #[error("transient execution failure: {0}")]
    Transient(String),
    #[error("non-retryable execution failure: {0}")]
    NonRetryable(String),
}

impl TaskExecutionError {
    /// Classifies a transient-looking message by the markers `spec.md` §4.4
    /// calls out (network/transport errors) vs. non-retryable markers
    /// (auth failures). Executors may use this to build their own error, or
    /// the dispatcher may call it on an unexpected/uncategorized message to
    /// fall back to "treat as transient" per the §7 taxonomy.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        const NON_RETRYABLE_MARKERS: &[&str] = &[
            "invalid token",
            "401",
            "please re-login",
            "unauthorized",
        ];
        if NON_RETRYABLE_MARKERS
            .iter()
            .any(|marker| lower.contains(marker))
        {
            return Self::NonRetryable(message);
        }
        Self::Transient(message)
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, Self::NonRetryable(_))
    }
}

/// Executes the actual work for a task: clone, generate, push, comment
/// update. The dispatcher treats this as an opaque fails-with-error call and
/// never inspects anything but `is_non_retryable`.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &Task) -> Result<TaskOutcome, TaskExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_classify_marks_auth_failures_non_retryable() {
        assert!(TaskExecutionError::classify("HTTP 401 Unauthorized").is_non_retryable());
        assert!(TaskExecutionError::classify("invalid token supplied").is_non_retryable());
        assert!(TaskExecutionError::classify("please re-login to continue").is_non_retryable());
    }

    #[test]
    fn unit_classify_marks_network_failures_transient() {
        for message in [
            "connection reset by peer",
            "i/o timeout",
            "eof",
            "connection refused",
            "broken pipe",
            "no such host",
            "network is unreachable",
            "temporary failure in name resolution",
        ] {
            assert!(
                !TaskExecutionError::classify(message).is_non_retryable(),
                "expected {message:?} to be classified transient"
            );
        }
    }
}

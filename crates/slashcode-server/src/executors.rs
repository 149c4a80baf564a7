use std::collections::HashMap;

use async_trait::async_trait;
use slashcode_contract::{AuthError, AuthProvider, InstallationToken, TaskExecutionError, TaskExecutor, TaskOutcome};
use slashcode_core::{current_unix_timestamp_ms, Task};
use tokio::process::Command;
use tracing::{debug, warn};

/// Shells out to a configured external CLI with the task's prompt on stdin,
/// following `tau-provider::cli_executable`'s "invoke an external CLI
/// binary" convention and `tau-runtime::background_jobs_runtime`'s
/// job-spawning shape. This is a minimal stand-in for the real
/// code-generation provider, which is out of this workspace's hard core.
pub struct ProcessTaskExecutor {
    command: String,
}

impl ProcessTaskExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

#[async_trait]
impl TaskExecutor for ProcessTaskExecutor {
    async fn execute(&self, task: &Task) -> Result<TaskOutcome, TaskExecutionError> {
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        debug!(task_id = %task.task_id, command = %self.command, "spawning task executor process");

        let mut child = Command::new(&self.command)
            .arg(&task.repo)
            .arg(task.number.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| TaskExecutionError::classify(format!("failed to spawn executor process: {err}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(task.prompt.as_bytes()).await;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| TaskExecutionError::classify(format!("executor process I/O error: {err}")))?;

        if output.status.success() {
            let summary = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let summary = if summary.is_empty() { "Task completed".to_string() } else { summary };
            Ok(TaskOutcome { summary })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("executor process exited with status {}", output.status)
            } else {
                stderr
            };
            Err(TaskExecutionError::classify(message))
        }
    }
}

/// Resolves the installer login from a static `repo -> login` map supplied
/// at startup, standing in for the real GitHub App installation flow.
///
/// TODO: replace with a JWT-based installation token minter once the
/// GitHub App credentials flow is brought into scope.
pub struct StaticInstallerAuthProvider {
    installers: HashMap<String, String>,
}

impl StaticInstallerAuthProvider {
    pub fn new(installers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self { installers: installers.into_iter().collect() }
    }
}

#[async_trait]
impl AuthProvider for StaticInstallerAuthProvider {
    async fn installation_owner(&self, repo: &str) -> Result<String, AuthError> {
        self.installers.get(repo).cloned().ok_or_else(|| AuthError::NoInstallation(repo.to_string()))
    }

    async fn installation_token(&self, repo: &str) -> Result<InstallationToken, AuthError> {
        if !self.installers.contains_key(repo) {
            return Err(AuthError::NoInstallation(repo.to_string()));
        }
        warn!(repo, "StaticInstallerAuthProvider issuing a placeholder token, not a real GitHub App token");
        Ok(InstallationToken {
            token: format!("static-token-for-{repo}"),
            expires_unix_ms: current_unix_timestamp_ms() + 3_600_000,
        })
    }
}

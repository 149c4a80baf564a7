use std::time::Duration;

use clap::Parser;
use slashcode_dispatch::DispatcherConfig;
use slashcode_intake::IntakeConfig;

/// Operator-facing CLI/environment configuration (`spec.md` §6). CLI flags
/// take precedence over the environment variable of the same name, which
/// takes precedence over the documented default, following `tau-cli`'s
/// `#[arg(long = .., env = ..)]` convention.
#[derive(Debug, Parser)]
#[command(name = "slashcode-server", about = "GitHub /code webhook ingestion and dispatch service")]
pub struct Cli {
    #[arg(long, env = "WEBHOOK_SECRET", help = "Shared secret used to verify X-Hub-Signature-256")]
    pub webhook_secret: String,

    #[arg(long, env = "TRIGGER_KEYWORD", default_value = "/code")]
    pub trigger_keyword: String,

    #[arg(long, env = "PERMISSION_MODE", default_value = "closed", help = "Set to 'open' to disable installer authorization")]
    pub permission_mode: String,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    #[arg(long, env = "WORKERS", default_value_t = 0, help = "0 normalizes to the documented default (4)")]
    pub workers: usize,

    #[arg(long, env = "QUEUE_SIZE", default_value_t = 0, help = "0 normalizes to 4 * workers")]
    pub queue_size: usize,

    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 0, help = "0 normalizes to the documented default (3)")]
    pub max_attempts: u32,

    #[arg(long, env = "INITIAL_BACKOFF_MS", default_value_t = 0)]
    pub initial_backoff_ms: u64,

    #[arg(long, env = "BACKOFF_MULTIPLIER", default_value_t = 0.0)]
    pub backoff_multiplier: f64,

    #[arg(long, env = "MAX_BACKOFF_MS", default_value_t = 0)]
    pub max_backoff_ms: u64,

    #[arg(long, env = "DEDUP_TTL_MS", default_value_t = 0, help = "0 normalizes to one hour")]
    pub dedup_ttl_ms: i64,

    #[arg(
        long,
        env = "TASK_EXECUTOR_COMMAND",
        default_value = "echo",
        help = "External CLI invoked by the default ProcessTaskExecutor"
    )]
    pub task_executor_command: String,

    #[arg(
        long = "installer",
        env = "STATIC_INSTALLERS",
        value_delimiter = ',',
        help = "repo=login pairs for the default StaticInstallerAuthProvider, e.g. owner/repo=owner"
    )]
    pub static_installers: Vec<String>,
}

impl Cli {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            workers: self.workers,
            queue_size: self.queue_size,
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
        .normalized()
    }

    pub fn intake_config(&self) -> IntakeConfig {
        IntakeConfig {
            trigger_keyword: self.trigger_keyword.clone(),
            permission_mode_open: self.permission_mode.eq_ignore_ascii_case("open"),
        }
    }

    pub fn static_installer_map(&self) -> Vec<(String, String)> {
        self.static_installers
            .iter()
            .filter_map(|pair| pair.split_once('=').map(|(repo, login)| (repo.to_string(), login.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_static_installer_map_parses_repo_equals_login_pairs() {
        let cli = Cli::parse_from([
            "slashcode-server",
            "--webhook-secret",
            "s",
            "--installer",
            "owner/repo=owner",
            "--installer",
            "other/repo=maintainer",
        ]);
        assert_eq!(
            cli.static_installer_map(),
            vec![
                ("owner/repo".to_string(), "owner".to_string()),
                ("other/repo".to_string(), "maintainer".to_string()),
            ]
        );
    }

    #[test]
    fn functional_permission_mode_open_is_case_insensitive() {
        let cli = Cli::parse_from(["slashcode-server", "--webhook-secret", "s", "--permission-mode", "OPEN"]);
        assert!(cli.intake_config().permission_mode_open);
    }

    #[test]
    fn regression_zero_dispatcher_fields_normalize_through_dispatcher_config() {
        let cli = Cli::parse_from(["slashcode-server", "--webhook-secret", "s"]);
        let config = cli.dispatcher_config();
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_size, 16);
    }
}

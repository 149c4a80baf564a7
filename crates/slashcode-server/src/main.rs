mod config;
mod executors;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use slashcode_dispatch::Dispatcher;
use slashcode_journal::{DedupTable, TaskJournal};
use tokio::net::TcpListener;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Cli;
use crate::executors::{ProcessTaskExecutor, StaticInstallerAuthProvider};
use crate::routes::{build_router, AppState};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let bind_addr = cli
        .bind_addr
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind-addr '{}'", cli.bind_addr))?;

    let journal = Arc::new(TaskJournal::new());
    let dedup = DedupTable::new(cli.dedup_ttl_ms);
    let auth = Arc::new(StaticInstallerAuthProvider::new(cli.static_installer_map()));
    let executor = Arc::new(ProcessTaskExecutor::new(cli.task_executor_command.clone()));
    let dispatcher = Dispatcher::new(cli.dispatcher_config(), executor, journal.clone());

    let state = Arc::new(AppState {
        webhook_secret: cli.webhook_secret.clone().into_bytes(),
        journal,
        dedup,
        dispatcher: dispatcher.clone(),
        auth,
        intake_config: cli.intake_config(),
    });
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind webhook server on {bind_addr}"))?;
    info!(addr = %bind_addr, "slashcode webhook server listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, draining dispatcher");
        })
        .await;

    let drained = dispatcher.shutdown(SHUTDOWN_DEADLINE).await;
    if !drained {
        tracing::warn!("dispatcher shutdown deadline elapsed with workers still in flight");
    }

    serve_result.context("webhook server exited unexpectedly")?;
    Ok(())
}

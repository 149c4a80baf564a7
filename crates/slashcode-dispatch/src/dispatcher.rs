use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slashcode_contract::TaskExecutor;
use slashcode_core::{JournalStatus, LogLevel, Task};
use slashcode_journal::TaskJournal;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::keyed_mutex::KeyedMutexTable;
use crate::retry::backoff_delay;

/// Backpressure errors from [`Dispatcher::enqueue`] (`spec.md` §7's
/// Backpressure taxonomy row).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("dispatcher queue is full")]
    QueueFull,
    #[error("dispatcher has been shut down")]
    QueueClosed,
}

/// Bounded-queue, fixed-worker-pool dispatcher (`spec.md` §4.3). Serializes
/// execution per `Task::entity_key` via a [`KeyedMutexTable`], retries
/// transient failures with exponential backoff, and never blocks its caller:
/// [`Dispatcher::enqueue`] is a non-blocking `try_send`.
pub struct Dispatcher {
    sender: mpsc::Sender<Task>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    worker_handles: AsyncMutex<Vec<JoinHandle<()>>>,
    shutdown_started: AtomicBool,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Spawns the worker pool. Must be called from within a Tokio runtime.
    pub fn new(
        config: DispatcherConfig,
        executor: Arc<dyn TaskExecutor>,
        journal: Arc<TaskJournal>,
    ) -> Arc<Self> {
        let config = config.normalized();
        let (sender, receiver) = mpsc::channel(config.queue_size);
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let (stop_tx, stop_rx) = watch::channel(false);
        let keyed_mutex = Arc::new(KeyedMutexTable::new());

        let handles: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    receiver.clone(),
                    stop_rx.clone(),
                    sender.clone(),
                    keyed_mutex.clone(),
                    executor.clone(),
                    journal.clone(),
                    config,
                ))
            })
            .collect();

        Arc::new(Self {
            sender,
            stop_tx,
            stop_rx,
            worker_handles: AsyncMutex::new(handles),
            shutdown_started: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Non-blocking admission into the bounded queue.
    pub fn enqueue(&self, task: Task) -> Result<(), EnqueueError> {
        try_enqueue(&self.sender, &self.stop_rx, task)
    }

    /// Signals workers to stop taking new work and waits up to `deadline`
    /// for in-flight executions and pending retry timers to drain. Returns
    /// `true` if every worker exited before the deadline. Idempotent: a
    /// second call observes the already-taken (now empty) handle list and
    /// returns immediately.
    pub async fn shutdown(&self, deadline: Duration) -> bool {
        if !self.shutdown_started.swap(true, Ordering::SeqCst) {
            let _ = self.stop_tx.send(true);
            info!("dispatcher shutdown initiated");
        }
        let handles = {
            let mut guard = self.worker_handles.lock().await;
            std::mem::take(&mut *guard)
        };
        let joined = tokio::time::timeout(deadline, async move {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await;
        joined.is_ok()
    }
}

fn try_enqueue(sender: &mpsc::Sender<Task>, stop_rx: &watch::Receiver<bool>, task: Task) -> Result<(), EnqueueError> {
    if *stop_rx.borrow() {
        return Err(EnqueueError::QueueClosed);
    }
    match sender.try_send(task) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(_)) => Err(EnqueueError::QueueFull),
        Err(mpsc::error::TrySendError::Closed(_)) => Err(EnqueueError::QueueClosed),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker_id: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<Task>>>,
    mut stop_rx: watch::Receiver<bool>,
    sender: mpsc::Sender<Task>,
    keyed_mutex: Arc<KeyedMutexTable>,
    executor: Arc<dyn TaskExecutor>,
    journal: Arc<TaskJournal>,
    config: DispatcherConfig,
) {
    debug!(worker_id, "dispatcher worker started");
    loop {
        if *stop_rx.borrow() {
            break;
        }
        let next = {
            let mut guard = receiver.lock().await;
            tokio::select! {
                biased;
                _ = stop_rx.changed() => None,
                item = guard.recv() => item,
            }
        };
        let Some(task) = next else { break };
        run_one_attempt(worker_id, task, &sender, &stop_rx, &keyed_mutex, &executor, &journal, &config).await;
    }
    debug!(worker_id, "dispatcher worker stopped");
}

#[allow(clippy::too_many_arguments)]
async fn run_one_attempt(
    worker_id: usize,
    task: Task,
    sender: &mpsc::Sender<Task>,
    stop_rx: &watch::Receiver<bool>,
    keyed_mutex: &Arc<KeyedMutexTable>,
    executor: &Arc<dyn TaskExecutor>,
    journal: &Arc<TaskJournal>,
    config: &DispatcherConfig,
) {
    let entity_key = task.entity_key();
    let _guard = keyed_mutex.lock(&entity_key).await;

    if task.attempt == 1 {
        let _ = journal.update_status(&task.task_id, JournalStatus::Running);
    }
    info!(task_id = %task.task_id, entity_key, attempt = task.attempt, worker_id, "executing task");

    match executor.execute(&task).await {
        Ok(outcome) => {
            let _ = journal.update_status(&task.task_id, JournalStatus::Completed);
            let _ = journal.add_log(&task.task_id, LogLevel::Success, outcome.summary);
        }
        Err(error) => {
            if error.is_non_retryable() || task.attempt >= config.max_attempts {
                warn!(task_id = %task.task_id, attempt = task.attempt, %error, "task failed, no further retries");
                let _ = journal.update_status(&task.task_id, JournalStatus::Failed);
                let _ = journal.add_log(&task.task_id, LogLevel::Error, error.to_string());
            } else {
                let next_attempt = task.attempt + 1;
                let delay = backoff_delay(config, next_attempt);
                let _ = journal.add_log(
                    &task.task_id,
                    LogLevel::Info,
                    format!("attempt {} failed transiently, retrying in {:?}: {}", task.attempt, delay, error),
                );
                let mut retry_task = task;
                retry_task.attempt = next_attempt;
                schedule_retry(retry_task, delay, sender.clone(), stop_rx.clone());
            }
        }
    }
}

/// Spawns a detached timer that re-enqueues `task` after `delay`, observing
/// the stop signal both while sleeping and while the queue is transiently
/// full, per `spec.md` §4.3's retry-scheduler requirements.
fn schedule_retry(task: Task, delay: Duration, sender: mpsc::Sender<Task>, mut stop_rx: watch::Receiver<bool>) {
    tokio::spawn(async move {
        tokio::select! {
            _ = stop_rx.changed() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        loop {
            if *stop_rx.borrow() {
                return;
            }
            match try_enqueue(&sender, &stop_rx, task.clone()) {
                Ok(()) => return,
                Err(EnqueueError::QueueClosed) => return,
                Err(EnqueueError::QueueFull) => {
                    tokio::select! {
                        _ = stop_rx.changed() => return,
                        _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                    }
                }
            }
        }
    });
}

//! In-memory task store.
//!
//! Tasks live for the lifetime of the process (bounded by a TTL) and are only
//! visible to requests served by the same process. Nothing is persisted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{A2aError, A2aResult};
use crate::types::{Task, TaskEvent, TaskState, TaskStatus};

/// Configuration for task store
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStoreConfig {
    /// How long a task is kept after its last update, in seconds (default: 3600)
    pub ttl_secs: u64,
    /// How often to run cleanup in seconds (default: 300)
    pub cleanup_interval_secs: u64,
}

impl Default for TaskStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            cleanup_interval_secs: 300,
        }
    }
}

/// Task with expiration tracking
#[derive(Debug, Clone)]
struct StoredTask {
    task: Task,
    expires_at: DateTime<Utc>,
}

/// In-memory task store with expiration support
#[derive(Debug)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, StoredTask>>,
    config: TaskStoreConfig,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_config(TaskStoreConfig::default())
    }

    pub fn with_config(config: TaskStoreConfig) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &TaskStoreConfig {
        &self.config
    }

    fn expiry(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(self.config.ttl_secs as i64)
    }

    /// Fetch a copy of a task, ignoring expired entries
    pub async fn get(&self, task_id: &str) -> Option<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(task_id).and_then(|stored| {
            if stored.expires_at < Utc::now() {
                None
            } else {
                Some(stored.task.clone())
            }
        })
    }

    /// Insert or replace a task
    pub async fn insert(&self, task: Task) {
        let stored = StoredTask {
            expires_at: self.expiry(),
            task,
        };
        self.tasks
            .write()
            .await
            .insert(stored.task.id.clone(), stored);
    }

    /// Apply a published event to the task it names.
    ///
    /// Events for a task that has already been canceled are ignored, so a
    /// search that finishes after a cancel does not resurrect the task.
    pub async fn apply(&self, event: &TaskEvent) -> A2aResult<()> {
        let task_id = match event {
            TaskEvent::Status(update) => &update.task_id,
            TaskEvent::Artifact(update) => &update.task_id,
        };

        let expires_at = self.expiry();
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .get_mut(task_id)
            .ok_or_else(|| A2aError::task_not_found(task_id))?;

        if stored.task.state() == TaskState::Canceled {
            debug!(task_id = %task_id, "Ignoring event for canceled task");
            return Ok(());
        }

        match event {
            TaskEvent::Status(update) => stored.task.set_status(update.status.clone()),
            TaskEvent::Artifact(update) => stored.task.add_artifact(update.artifact.clone()),
        }
        stored.expires_at = expires_at;
        Ok(())
    }

    /// Set a task to `canceled`.
    ///
    /// Without `strict` the state is overwritten whatever it was, including
    /// terminal states. With `strict`, terminal tasks are rejected.
    pub async fn cancel(&self, task_id: &str, strict: bool) -> A2aResult<Task> {
        let now = Utc::now();
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .get_mut(task_id)
            .filter(|stored| stored.expires_at >= now)
            .ok_or_else(|| A2aError::task_not_found(task_id))?;

        let previous = stored.task.state();
        if previous.is_terminal() {
            if strict {
                return Err(A2aError::task_not_cancelable(task_id, previous.to_string()));
            }
            warn!(
                task_id = %task_id,
                previous = %previous,
                "Overwriting terminal task state with canceled"
            );
        }

        stored.task.set_status(TaskStatus::new(TaskState::Canceled));
        info!(task_id = %task_id, previous = %previous, "Task canceled");
        Ok(stored.task.clone())
    }

    /// Clean up expired tasks
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|id, stored| {
            let keep = stored.expires_at >= now;
            if !keep {
                debug!(task_id = %id, "Cleaned up expired task");
            }
            keep
        });

        let count = before - tasks.len();
        if count > 0 {
            info!(count, "Cleaned up expired tasks");
        }
        count
    }

    /// Get total task count, expired entries included until cleanup runs
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

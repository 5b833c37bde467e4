//! Task update event types.

use serde::{Deserialize, Serialize};

use super::{Artifact, TaskStatus};

/// Event for task status updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// Task ID
    pub task_id: String,

    /// Context ID
    pub context_id: String,

    /// New status
    pub status: TaskStatus,

    /// Whether this is the last event for the task
    #[serde(rename = "final")]
    pub is_final: bool,

    /// Object discriminator, always `"status-update"`
    #[serde(default = "status_update_kind")]
    pub kind: String,
}

fn status_update_kind() -> String {
    "status-update".to_string()
}

impl TaskStatusUpdateEvent {
    pub fn new(
        task_id: impl Into<String>,
        context_id: impl Into<String>,
        status: TaskStatus,
        is_final: bool,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            context_id: context_id.into(),
            status,
            is_final,
            kind: status_update_kind(),
        }
    }
}

/// Event for artifact updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// Task ID
    pub task_id: String,

    /// Context ID
    pub context_id: String,

    /// The artifact being added or updated
    pub artifact: Artifact,

    /// Whether this is the last chunk of the artifact
    #[serde(default)]
    pub last_chunk: bool,

    /// Object discriminator, always `"artifact-update"`
    #[serde(default = "artifact_update_kind")]
    pub kind: String,
}

fn artifact_update_kind() -> String {
    "artifact-update".to_string()
}

impl TaskArtifactUpdateEvent {
    pub fn new(task_id: impl Into<String>, context_id: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            task_id: task_id.into(),
            context_id: context_id.into(),
            artifact,
            last_chunk: true,
            kind: artifact_update_kind(),
        }
    }
}

/// Unified task event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskEvent {
    /// Task status update
    Status(TaskStatusUpdateEvent),

    /// Artifact update
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskEvent {
    /// Whether this event closes the task's event sequence
    pub fn is_final(&self) -> bool {
        matches!(self, TaskEvent::Status(update) if update.is_final)
    }
}

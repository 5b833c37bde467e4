//! Tasks and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Artifact, Message};

/// One doctor search conversation.
///
/// Tasks are created in [`TaskState::Submitted`] when a message-send names a
/// task that does not exist yet, and then move through the lifecycle as the
/// agent executor publishes status events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    /// Context ID grouping related tasks and messages
    pub context_id: String,

    pub status: TaskStatus,

    /// Messages exchanged during the task, oldest first
    #[serde(default)]
    pub history: Vec<Message>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Object discriminator, always `"task"`
    #[serde(default = "task_kind")]
    pub kind: String,
}

fn task_kind() -> String {
    "task".to_string()
}

impl Task {
    /// Create a new task in the `submitted` state
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Submitted),
            history: Vec::new(),
            artifacts: Vec::new(),
            metadata: HashMap::new(),
            kind: task_kind(),
        }
    }

    /// Append a message to the task history
    pub fn add_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Add an artifact, replacing any earlier artifact with the same ID
    pub fn add_artifact(&mut self, artifact: Artifact) {
        if let Some(existing) = self
            .artifacts
            .iter_mut()
            .find(|a| a.artifact_id == artifact.artifact_id)
        {
            *existing = artifact;
        } else {
            self.artifacts.push(artifact);
        }
    }

    /// Replace the task status.
    ///
    /// A status message, if any, is also appended to the history.
    pub fn set_status(&mut self, status: TaskStatus) {
        if let Some(message) = &status.message {
            self.history.push(message.clone());
        }
        self.status = status;
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.status.state
    }

    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Return a copy keeping only the last `length` history entries
    pub fn with_history_length(mut self, length: Option<usize>) -> Self {
        if let Some(length) = length
            && self.history.len() > length
        {
            let skip = self.history.len() - length;
            self.history.drain(..skip);
        }
        self
    }
}

/// Status of a task: lifecycle state plus when it was entered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Lifecycle state
    pub state: TaskState,

    /// When this state was entered
    pub timestamp: DateTime<Utc>,

    /// Optional agent message describing the state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// Error details, only present for `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl TaskStatus {
    /// Create a status for `state` stamped with the current time
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
            message: None,
            error: None,
        }
    }

    /// Create a `failed` status carrying an error
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self {
            error: Some(TaskError {
                code,
                message: message.into(),
            }),
            ..Self::new(TaskState::Failed)
        }
    }

    /// Attach an agent message
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Error attached to a failed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    /// JSON-RPC style error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received but not started
    Submitted,

    Working,

    Completed,

    Failed,

    /// Task was canceled by the caller
    Canceled,
}

impl TaskState {
    /// `completed`, `failed` and `canceled` accept no further events
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::Working => write!(f, "working"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Canceled => write!(f, "canceled"),
        }
    }
}

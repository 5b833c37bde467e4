//! Event publication interface between an agent executor and the task store.
//!
//! Executors report progress only through [`EventBus`]. Both operations are
//! fire-and-forget: they never fail from the executor's point of view, they
//! are delivered in call order, and the event has been applied by the time
//! the call returns.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::TaskStore;
use crate::types::{TaskArtifactUpdateEvent, TaskEvent, TaskStatusUpdateEvent};

/// Sink for task status and artifact events
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a status transition
    async fn emit_status(&self, event: TaskStatusUpdateEvent);

    /// Publish an artifact
    async fn emit_artifact(&self, event: TaskArtifactUpdateEvent);
}

/// Event bus that applies every event to a [`TaskStore`] and keeps an
/// ordered log of what was published.
///
/// Events arriving after a final status event are dropped.
pub struct StoreEventBus {
    store: Arc<TaskStore>,
    log: Mutex<Vec<TaskEvent>>,
}

impl StoreEventBus {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self {
            store,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Events published so far, in order
    pub async fn events(&self) -> Vec<TaskEvent> {
        self.log.lock().await.clone()
    }

    /// Whether a final status event has been published
    pub async fn has_final(&self) -> bool {
        self.log.lock().await.iter().any(TaskEvent::is_final)
    }

    async fn publish(&self, event: TaskEvent) {
        let mut log = self.log.lock().await;
        if log.iter().any(TaskEvent::is_final) {
            warn!(?event, "Dropping event published after final status");
            return;
        }

        if let Err(e) = self.store.apply(&event).await {
            warn!(error = %e, "Failed to apply task event");
        }
        log.push(event);
    }
}

#[async_trait]
impl EventBus for StoreEventBus {
    async fn emit_status(&self, event: TaskStatusUpdateEvent) {
        debug!(
            task_id = %event.task_id,
            state = %event.status.state,
            is_final = event.is_final,
            "Status event"
        );
        self.publish(TaskEvent::Status(event)).await;
    }

    async fn emit_artifact(&self, event: TaskArtifactUpdateEvent) {
        debug!(
            task_id = %event.task_id,
            artifact_id = %event.artifact.artifact_id,
            "Artifact event"
        );
        self.publish(TaskEvent::Artifact(event)).await;
    }
}

/// Event bus that only records events, for exercising executors in isolation
#[derive(Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<TaskEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, in order
    pub async fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn emit_status(&self, event: TaskStatusUpdateEvent) {
        self.events.lock().await.push(TaskEvent::Status(event));
    }

    async fn emit_artifact(&self, event: TaskArtifactUpdateEvent) {
        self.events.lock().await.push(TaskEvent::Artifact(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Artifact, Part, Task, TaskState, TaskStatus};

    #[tokio::test]
    async fn test_store_bus_applies_events_in_order() {
        let store = Arc::new(TaskStore::new());
        store.insert(Task::new("t-1", "c-1")).await;
        let bus = StoreEventBus::new(Arc::clone(&store));

        bus.emit_status(TaskStatusUpdateEvent::new(
            "t-1",
            "c-1",
            TaskStatus::new(TaskState::Working),
            false,
        ))
        .await;
        assert_eq!(store.get("t-1").await.unwrap().state(), TaskState::Working);

        bus.emit_artifact(TaskArtifactUpdateEvent::new(
            "t-1",
            "c-1",
            Artifact::new("a-1").with_part(Part::text("result")),
        ))
        .await;
        bus.emit_status(TaskStatusUpdateEvent::new(
            "t-1",
            "c-1",
            TaskStatus::new(TaskState::Completed),
            true,
        ))
        .await;

        let task = store.get("t-1").await.unwrap();
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.artifacts.len(), 1);
        assert_eq!(bus.events().await.len(), 3);
        assert!(bus.has_final().await);
    }

    #[tokio::test]
    async fn test_store_bus_drops_events_after_final() {
        let store = Arc::new(TaskStore::new());
        store.insert(Task::new("t-1", "c-1")).await;
        let bus = StoreEventBus::new(Arc::clone(&store));

        bus.emit_status(TaskStatusUpdateEvent::new(
            "t-1",
            "c-1",
            TaskStatus::failed(-32602, "no params"),
            true,
        ))
        .await;
        bus.emit_status(TaskStatusUpdateEvent::new(
            "t-1",
            "c-1",
            TaskStatus::new(TaskState::Completed),
            true,
        ))
        .await;

        assert_eq!(store.get("t-1").await.unwrap().state(), TaskState::Failed);
        assert_eq!(bus.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_recording_bus_keeps_order() {
        let bus = RecordingEventBus::new();
        bus.emit_status(TaskStatusUpdateEvent::new(
            "t",
            "c",
            TaskStatus::new(TaskState::Working),
            false,
        ))
        .await;
        bus.emit_artifact(TaskArtifactUpdateEvent::new("t", "c", Artifact::new("a")))
            .await;

        let events = bus.events().await;
        assert!(matches!(events[0], TaskEvent::Status(_)));
        assert!(matches!(events[1], TaskEvent::Artifact(_)));
    }
}

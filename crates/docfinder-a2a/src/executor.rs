//! Agent executor abstraction.
//!
//! Implement [`AgentExecutor`] to define what the agent does with an incoming
//! message. The server creates the task, hands the executor a
//! [`RequestContext`] and an [`EventBus`], and reads the final task state back
//! from the store once the executor returns.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::bus::EventBus;
use crate::error::A2aResult;
use crate::types::{
    AgentSkill, Artifact, Message, TaskArtifactUpdateEvent, TaskStatus, TaskStatusUpdateEvent,
};

/// Everything an executor needs to know about one message-send
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Task being worked on
    pub task_id: String,
    /// Context the task belongs to
    pub context_id: String,
    /// Incoming user message
    pub message: Message,
    /// Request-level metadata (`params.metadata`)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RequestContext {
    /// Build a status event for this task
    pub fn status_event(&self, status: TaskStatus, is_final: bool) -> TaskStatusUpdateEvent {
        TaskStatusUpdateEvent::new(&self.task_id, &self.context_id, status, is_final)
    }

    /// Build an artifact event for this task
    pub fn artifact_event(&self, artifact: Artifact) -> TaskArtifactUpdateEvent {
        TaskArtifactUpdateEvent::new(&self.task_id, &self.context_id, artifact)
    }

    /// Build an agent reply bound to this task
    pub fn agent_message(&self, text: impl Into<String>) -> Message {
        Message::agent(text).for_task(&self.task_id, &self.context_id)
    }
}

/// Agent business logic entry point
#[async_trait]
pub trait AgentExecutor: Send + Sync + 'static {
    /// Skills advertised in the agent card
    fn skills(&self) -> Vec<AgentSkill>;

    /// Process one message.
    ///
    /// Progress is reported only through `bus`; the last event published must
    /// be a status event with `final = true`. An `Err` return is treated as
    /// an unexpected failure and turned into a generic internal error by the
    /// server.
    async fn execute(&self, ctx: &RequestContext, bus: &dyn EventBus) -> A2aResult<()>;
}

//! # docfinder A2A - Agent2Agent Protocol Adapter
//!
//! This crate exposes an agent over the A2A (Agent2Agent) protocol: agent
//! card discovery, a JSON-RPC 2.0 endpoint, the HTTP+JSON binding, and an
//! in-memory task store that follows the A2A task lifecycle.
//!
//! ## Protocol Overview
//!
//! 1. **Agent Card**: JSON document describing the agent and its skills,
//!    served at `/.well-known/agent-card.json`
//! 2. **Tasks**: units of work moving `submitted → working → completed/failed`,
//!    or set to `canceled` by a client
//! 3. **Messages**: user input and agent replies, kept as task history
//! 4. **Artifacts**: outputs produced by a task
//!
//! Agent behavior plugs in through [`AgentExecutor`]; the executor reports
//! progress by publishing events on an [`EventBus`], which the server applies
//! to the [`TaskStore`].
//!
//! ## Example: Working with Tasks
//!
//! ```rust
//! use docfinder_a2a::{Message, Task, TaskState, TaskStatus};
//!
//! let mut task = Task::new("task-001", "ctx-001");
//! task.add_message(Message::user("Find doctors named Smith in 10001"));
//! assert_eq!(task.state(), TaskState::Submitted);
//!
//! task.set_status(TaskStatus::new(TaskState::Completed));
//! assert!(task.is_terminal());
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod types;

pub use bus::{EventBus, RecordingEventBus, StoreEventBus};
pub use config::{AgentIdentity, ConfigError, ServerConfig, ServerConfigBuilder};
pub use error::{A2aError, A2aResult, ErrorResponse, codes};
pub use executor::{AgentExecutor, RequestContext};
pub use server::A2aServer;
pub use store::{TaskStore, TaskStoreConfig};
pub use types::{
    AgentCapabilities, AgentCard, AgentInterface, AgentProvider, AgentSkill, Artifact, DataPart,
    JsonRpcError, JsonRpcId, JsonRpcResponse, Message, PROTOCOL_VERSION, Part, Role,
    SendMessageConfiguration, SendMessageParams, Task, TaskArtifactUpdateEvent, TaskError,
    TaskEvent, TaskIdParams, TaskQueryParams, TaskState, TaskStatus, TaskStatusUpdateEvent,
    TextPart, Transport,
};

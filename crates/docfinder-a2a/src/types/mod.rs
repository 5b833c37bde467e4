//! A2A Protocol Core Types
//!
//! This module defines the data types exchanged over the Agent2Agent (A2A)
//! protocol by the doctor search agent.
//!
//! ## Module Structure
//!
//! - [`task`] - Task lifecycle and status types
//! - [`message`] - Message and role types
//! - [`part`] - Content part types (text, data)
//! - [`artifact`] - Task output artifacts
//! - [`agent_card`] - Agent capability discovery
//! - [`events`] - Status and artifact update events
//! - [`request`] - Request parameter types
//! - [`jsonrpc`] - JSON-RPC 2.0 envelope

mod agent_card;
mod artifact;
mod events;
mod jsonrpc;
mod message;
mod part;
mod request;
mod task;

pub use agent_card::{
    AgentCapabilities, AgentCard, AgentInterface, AgentProvider, AgentSkill, PROTOCOL_VERSION,
    Transport,
};
pub use artifact::Artifact;
pub use events::{TaskArtifactUpdateEvent, TaskEvent, TaskStatusUpdateEvent};
pub use jsonrpc::{JSONRPC_VERSION, JsonRpcError, JsonRpcId, JsonRpcResponse, RpcMethod};
pub use message::{Message, Role};
pub use part::{DataPart, Part, TextPart};
pub use request::{SendMessageConfiguration, SendMessageParams, TaskIdParams, TaskQueryParams};
pub use task::{Task, TaskError, TaskState, TaskStatus};

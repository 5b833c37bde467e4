//! Agent card: who the agent is, where it listens, and what it can do.

use serde::{Deserialize, Serialize};

/// Protocol version advertised in agent cards
pub const PROTOCOL_VERSION: &str = "0.3.0";

/// Discovery document served from the well-known paths.
///
/// Rebuilt for every request so that `url` matches the address the caller
/// used to reach the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,

    pub description: String,

    pub version: String,

    /// Primary endpoint URL (JSON-RPC transport)
    pub url: String,

    /// A2A protocol version
    pub protocol_version: String,

    /// Transport served at `url`
    pub preferred_transport: Transport,

    /// Other transports and where they are served
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_interfaces: Vec<AgentInterface>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,

    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// Media types accepted as input
    #[serde(default)]
    pub default_input_modes: Vec<String>,

    /// Media types produced as output
    #[serde(default)]
    pub default_output_modes: Vec<String>,

    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: version.into(),
            url: url.into(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            preferred_transport: Transport::JsonRpc,
            additional_interfaces: Vec::new(),
            provider: None,
            capabilities: AgentCapabilities::default(),
            default_input_modes: vec!["text/plain".to_string(), "application/json".to_string()],
            default_output_modes: vec!["text/plain".to_string(), "application/json".to_string()],
            skills: Vec::new(),
        }
    }

    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Add several skills
    pub fn with_skills(mut self, skills: impl IntoIterator<Item = AgentSkill>) -> Self {
        self.skills.extend(skills);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Advertise an additional transport
    pub fn with_interface(mut self, transport: Transport, url: impl Into<String>) -> Self {
        self.additional_interfaces.push(AgentInterface {
            transport,
            url: url.into(),
        });
        self
    }

    pub fn with_provider(mut self, provider: AgentProvider) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Transport protocol identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "JSONRPC")]
    JsonRpc,
    #[serde(rename = "HTTP+JSON")]
    HttpJson,
}

/// A transport and the URL it is served at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInterface {
    pub transport: Transport,
    pub url: String,
}

/// Organization operating the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvider {
    pub organization: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,

    #[serde(default)]
    pub push_notifications: bool,

    /// Whether task status history is kept
    #[serde(default)]
    pub state_transition_history: bool,
}

/// One advertised capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,

    pub name: String,

    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Example prompts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,

    /// Input media types, overriding the card defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modes: Vec<String>,

    /// Output media types, overriding the card defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modes: Vec<String>,
}

impl AgentSkill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            examples: Vec::new(),
            input_modes: Vec::new(),
            output_modes: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add example prompts
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples.extend(examples.into_iter().map(Into::into));
        self
    }
}

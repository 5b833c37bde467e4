//! # Environment-Based Configuration
//!
//! Server settings are read from the environment so the same binary can run
//! locally, in a container, or behind a function URL without a rebuild.
//!
//! ## Environment Variables
//!
//! - `DOCFINDER_BIND_ADDR` - Listen address (default: 0.0.0.0:8080)
//! - `DOCFINDER_AGENT_NAME` - Agent card name (default: "Doctor Search Agent")
//! - `DOCFINDER_AGENT_VERSION` - Agent card version (default: crate version)
//! - `DOCFINDER_AGENT_DESCRIPTION` - Agent card description
//! - `DOCFINDER_PUBLIC_BASE_URL` - Externally visible base URL; when unset the
//!   agent card URL is derived from the request's forwarding headers
//! - `DOCFINDER_FUNCTION_NAME` - Deployment name reported by `/health`
//! - `DOCFINDER_DEBUG` - Include internal error detail in responses (default: false)
//! - `DOCFINDER_TASK_TTL_SECS` - Task lifetime after last update (default: 3600)
//! - `DOCFINDER_CLEANUP_INTERVAL_SECS` - Expired task sweep interval (default: 300)
//! - `DOCFINDER_ENABLE_CORS` - Enable permissive CORS (default: true)
//! - `DOCFINDER_MAX_BODY_SIZE` - Maximum request body size in bytes (default: 1048576)
//! - `DOCFINDER_STRICT_CANCEL` - Reject canceling terminal tasks (default: false)

use std::{env, net::SocketAddr};
use url::Url;

use crate::store::TaskStoreConfig;

/// Default agent card name
pub const DEFAULT_AGENT_NAME: &str = "Doctor Search Agent";

/// Default agent card description
pub const DEFAULT_AGENT_DESCRIPTION: &str =
    "Searches a doctor directory by zipcode, last name, specialty and gender.";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Identity published in the agent card
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for AgentIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: DEFAULT_AGENT_DESCRIPTION.to_string(),
        }
    }
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub identity: AgentIdentity,
    pub public_base_url: Option<Url>,
    pub function_name: Option<String>,
    pub debug: bool,
    pub store: TaskStoreConfig,
    pub enable_cors: bool,
    pub max_body_size: usize,
    pub strict_cancel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            identity: AgentIdentity::default(),
            public_base_url: None,
            function_name: None,
            debug: false,
            store: TaskStoreConfig::default(),
            enable_cors: true,
            max_body_size: 1024 * 1024,
            strict_cancel: false,
        }
    }
}

impl ServerConfig {
    /// Public base URL without a trailing slash
    pub fn base_url(&self) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
    }
}

/// Builder for [`ServerConfig`] with environment variable support
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    bind_addr: String,
    identity: AgentIdentity,
    public_base_url: Option<String>,
    function_name: Option<String>,
    debug: bool,
    store: TaskStoreConfig,
    enable_cors: bool,
    max_body_size: usize,
    strict_cancel: bool,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: defaults.bind_addr.to_string(),
            identity: defaults.identity,
            public_base_url: None,
            function_name: None,
            debug: defaults.debug,
            store: defaults.store,
            enable_cors: defaults.enable_cors,
            max_body_size: defaults.max_body_size,
            strict_cancel: defaults.strict_cancel,
        }
    }
}

impl ServerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(addr) = get_env_string("DOCFINDER_BIND_ADDR") {
            builder = builder.bind_addr(addr);
        }

        // Agent identity
        if let Some(name) = get_env_string("DOCFINDER_AGENT_NAME") {
            builder.identity.name = name;
        }
        if let Some(version) = get_env_string("DOCFINDER_AGENT_VERSION") {
            builder.identity.version = version;
        }
        if let Some(description) = get_env_string("DOCFINDER_AGENT_DESCRIPTION") {
            builder.identity.description = description;
        }
        if let Some(url) = get_env_string("DOCFINDER_PUBLIC_BASE_URL") {
            builder = builder.public_base_url(url);
        }
        if let Some(name) = get_env_string("DOCFINDER_FUNCTION_NAME") {
            builder = builder.function_name(name);
        }

        if let Some(debug) = get_env_bool("DOCFINDER_DEBUG")? {
            builder = builder.debug(debug);
        }
        if let Some(ttl) = get_env_u64("DOCFINDER_TASK_TTL_SECS")? {
            builder.store.ttl_secs = ttl;
        }
        if let Some(interval) = get_env_u64("DOCFINDER_CLEANUP_INTERVAL_SECS")? {
            builder.store.cleanup_interval_secs = interval;
        }
        if let Some(cors) = get_env_bool("DOCFINDER_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }
        if let Some(size) = get_env_usize("DOCFINDER_MAX_BODY_SIZE")? {
            builder = builder.max_body_size(size);
        }
        if let Some(strict) = get_env_bool("DOCFINDER_STRICT_CANCEL")? {
            builder = builder.strict_cancel(strict);
        }

        Ok(builder)
    }

    /// Set the listen address (`host:port`)
    #[must_use]
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the agent card identity
    #[must_use]
    pub fn identity(mut self, identity: AgentIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set the externally visible base URL
    #[must_use]
    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Set the deployment name reported by the health endpoint
    #[must_use]
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Include internal error detail in failed task messages
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set task store configuration
    #[must_use]
    pub fn store(mut self, store: TaskStoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Enable or disable CORS
    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set maximum request body size in bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Reject cancel requests for tasks already in a terminal state
    #[must_use]
    pub fn strict_cancel(mut self, strict: bool) -> Self {
        self.strict_cancel = strict;
        self
    }

    /// Validate configuration and build [`ServerConfig`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.validate()?;

        let bind_addr = self.bind_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::ValidationError(format!("bind_addr '{}' is invalid: {e}", self.bind_addr))
        })?;

        let public_base_url = self
            .public_base_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        Ok(ServerConfig {
            bind_addr,
            identity: self.identity,
            public_base_url,
            function_name: self.function_name,
            debug: self.debug,
            store: self.store,
            enable_cors: self.enable_cors,
            max_body_size: self.max_body_size,
            strict_cancel: self.strict_cancel,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent name cannot be empty".to_string(),
            ));
        }
        if self.identity.version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent version cannot be empty".to_string(),
            ));
        }

        if self.store.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "task_ttl_secs must be greater than 0".to_string(),
            ));
        }
        if self.store.cleanup_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cleanup_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size > 16 * 1024 * 1024 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be <= 16MB".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::ValidationError(format!("public_base_url '{raw}' is invalid: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::ValidationError(format!(
            "public_base_url must use http or https, got '{scheme}'"
        ))),
    }
}

// Environment variable helpers, shared with other docfinder crates

/// Read a string variable; empty values count as unset
pub fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|val| !val.trim().is_empty())
}

/// Read a boolean variable (`true/false/1/0/yes/no/on/off`)
pub fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match get_env_string(key) {
        Some(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        None => Ok(None),
    }
}

pub fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    get_env_parsed(key, "u64")
}

pub fn get_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    get_env_parsed(key, "usize")
}

fn get_env_parsed<T>(key: &str, type_name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_string(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid {type_name} value '{val}': {e}"),
            }),
        None => Ok(None),
    }
}

//! Search backend configuration.
//!
//! ## Environment Variables
//!
//! - `DOCFINDER_SEARCH_URL` - Remote search endpoint (optional)
//! - `DOCFINDER_SEARCH_TIMEOUT_SECS` - Remote request timeout (default: 10)
//! - `DOCFINDER_REQUIRED_FIELDS` - `zipcode-or-lastname` (default) or
//!   `zipcode-lastname-or-specialty`
//! - `DOCFINDER_FIXTURES_PATH` - JSON file of doctors for the in-memory backend
//!
//! With neither a URL nor a fixtures file, the built-in sample directory is
//! used.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use docfinder_a2a::config::{ConfigError, get_env_string, get_env_u64};

use crate::collaborator::{DoctorSearch, FixtureDoctorSearch, HttpDoctorSearch, SearchError};
use crate::query::RequiredFields;

/// Default remote search timeout
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

/// Where doctor searches are sent, and how strict extraction is
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub search_url: Option<Url>,
    pub timeout: Duration,
    pub required_fields: RequiredFields,
    pub fixtures_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_url: None,
            timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            required_fields: RequiredFields::default(),
            fixtures_path: None,
        }
    }
}

impl SearchConfig {
    /// Build the configured backend. A search URL takes precedence over a
    /// fixtures file.
    pub async fn backend(&self) -> Result<Arc<dyn DoctorSearch>, SearchError> {
        if let Some(url) = &self.search_url {
            info!(endpoint = %url, timeout_secs = self.timeout.as_secs(), "Using HTTP search backend");
            return Ok(Arc::new(HttpDoctorSearch::new(url.clone(), self.timeout)?));
        }

        if let Some(path) = &self.fixtures_path {
            let fixtures = FixtureDoctorSearch::load(path).await?;
            info!(path = %path.display(), doctors = fixtures.len(), "Using fixture search backend");
            return Ok(Arc::new(fixtures));
        }

        warn!("No search backend configured, serving the built-in sample directory");
        Ok(Arc::new(FixtureDoctorSearch::sample()?))
    }
}

/// Builder for [`SearchConfig`]
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    search_url: Option<String>,
    timeout_secs: Option<u64>,
    required_fields: Option<String>,
    fixtures_path: Option<PathBuf>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from `DOCFINDER_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            search_url: get_env_string("DOCFINDER_SEARCH_URL"),
            timeout_secs: get_env_u64("DOCFINDER_SEARCH_TIMEOUT_SECS")?,
            required_fields: get_env_string("DOCFINDER_REQUIRED_FIELDS"),
            fixtures_path: get_env_string("DOCFINDER_FIXTURES_PATH").map(PathBuf::from),
        })
    }

    #[must_use]
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn required_fields(mut self, policy: impl Into<String>) -> Self {
        self.required_fields = Some(policy.into());
        self
    }

    #[must_use]
    pub fn fixtures_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixtures_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let search_url = self
            .search_url
            .map(|raw| {
                let url = Url::parse(&raw).map_err(|e| {
                    ConfigError::ValidationError(format!("invalid search URL '{raw}': {e}"))
                })?;
                match url.scheme() {
                    "http" | "https" => Ok(url),
                    scheme => Err(ConfigError::ValidationError(format!(
                        "search URL must use http or https, got '{scheme}'"
                    ))),
                }
            })
            .transpose()?;

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "search timeout must be greater than 0".to_string(),
            ));
        }

        let required_fields = self
            .required_fields
            .map(|raw| raw.parse::<RequiredFields>())
            .transpose()
            .map_err(ConfigError::ValidationError)?
            .unwrap_or_default();

        Ok(SearchConfig {
            search_url,
            timeout: Duration::from_secs(timeout_secs),
            required_fields,
            fixtures_path: self.fixtures_path,
        })
    }
}

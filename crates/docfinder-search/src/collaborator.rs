//! Doctor search backends.
//!
//! The lookup itself lives outside this process. [`DoctorSearch`] is the
//! seam; [`HttpDoctorSearch`] posts the query to a remote endpoint and
//! [`FixtureDoctorSearch`] filters a local JSON file, for development and
//! tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::query::{Gender, SearchQuery};

/// Sample directory compiled into the binary
const SAMPLE_FIXTURES: &str = include_str!("../fixtures/doctors.json");

/// One doctor as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRecord {
    #[serde(default, alias = "fullName", alias = "full_name")]
    pub name: String,

    #[serde(default, alias = "address1", alias = "street")]
    pub address: String,

    #[serde(default)]
    pub city: String,

    #[serde(default, alias = "specialty", alias = "taxonomy")]
    pub classification: String,
}

impl DoctorRecord {
    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            classification: self.classification.trim().to_string(),
        }
    }
}

/// Errors raised by a search backend
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend answered with a non-200 status code
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("Failed to load fixtures from {path}: {message}")]
    Fixture { path: PathBuf, message: String },
}

/// Backend reply: `result` holds records on 200 and an error string otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub result: Value,
}

impl SearchResponse {
    pub fn into_records(self) -> Result<Vec<DoctorRecord>, SearchError> {
        if self.status_code != 200 {
            let message = match self.result {
                Value::String(message) => message,
                Value::Null => format!("search backend returned status {}", self.status_code),
                other => other.to_string(),
            };
            return Err(SearchError::Backend {
                status: self.status_code,
                message,
            });
        }

        match self.result {
            Value::Null => Ok(Vec::new()),
            value @ Value::Array(_) => serde_json::from_value(value)
                .map_err(|e| SearchError::InvalidResponse(format!("malformed records: {e}"))),
            other => Err(SearchError::InvalidResponse(format!(
                "expected an array of records, got {other}"
            ))),
        }
    }
}

/// Doctor lookup
#[async_trait]
pub trait DoctorSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DoctorRecord>, SearchError>;
}

/// Backend reached over HTTP: the query is POSTed as JSON and the reply is
/// a [`SearchResponse`]
#[derive(Debug, Clone)]
pub struct HttpDoctorSearch {
    client: Client,
    endpoint: Url,
}

impl HttpDoctorSearch {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DoctorSearch for HttpDoctorSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DoctorRecord>, SearchError> {
        debug!(endpoint = %self.endpoint, ?query, "Calling search backend");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                SearchError::InvalidResponse(e.to_string())
            } else {
                SearchError::Backend {
                    status: status.as_u16(),
                    message: format!("search backend returned HTTP {status}: {}", body.trim()),
                }
            }
        })?;

        let records = parsed.into_records();
        if let Err(e) = &records {
            warn!(endpoint = %self.endpoint, error = %e, "Search backend reported an error");
        }
        records
    }
}

/// Fixture entry: a record plus the attributes used for filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDoctor {
    #[serde(flatten)]
    pub record: DoctorRecord,

    #[serde(default)]
    pub zipcode: Option<u32>,

    #[serde(default)]
    pub gender: Option<Gender>,
}

impl FixtureDoctor {
    fn matches(&self, query: &SearchQuery) -> bool {
        let zipcode_ok = query.zipcode.is_none_or(|zip| self.zipcode == Some(zip));
        let gender_ok = query
            .gender
            .is_none_or(|gender| self.gender.is_none_or(|own| own == gender));
        let lastname_ok = query.lastname.as_deref().is_none_or(|lastname| {
            self.record
                .name
                .split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
                .any(|word| word.eq_ignore_ascii_case(lastname))
        });
        let specialty_ok = query.specialty.as_deref().is_none_or(|specialty| {
            self.record
                .classification
                .to_lowercase()
                .contains(&specialty.to_lowercase())
        });

        zipcode_ok && gender_ok && lastname_ok && specialty_ok
    }
}

/// In-memory backend over a fixed list of doctors
#[derive(Debug, Clone, Default)]
pub struct FixtureDoctorSearch {
    doctors: Vec<FixtureDoctor>,
}

impl FixtureDoctorSearch {
    pub fn new(doctors: Vec<FixtureDoctor>) -> Self {
        Self { doctors }
    }

    /// Parse a JSON array of fixture entries
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// Load fixtures from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let fixture_error = |message: String| SearchError::Fixture {
            path: path.to_path_buf(),
            message,
        };

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| fixture_error(e.to_string()))?;
        Self::from_json(&json).map_err(|e| fixture_error(e.to_string()))
    }

    /// Small built-in directory for local runs
    pub fn sample() -> Result<Self, SearchError> {
        Self::from_json(SAMPLE_FIXTURES).map_err(|e| SearchError::Fixture {
            path: PathBuf::from("<built-in>"),
            message: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

#[async_trait]
impl DoctorSearch for FixtureDoctorSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DoctorRecord>, SearchError> {
        let records: Vec<DoctorRecord> = self
            .doctors
            .iter()
            .filter(|doctor| doctor.matches(query))
            .map(|doctor| doctor.record.clone())
            .collect();
        debug!(count = records.len(), ?query, "Fixture search");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_aliases_and_defaults() {
        let record: DoctorRecord = serde_json::from_value(json!({
            "fullName": "Dr. Lee",
            "address1": "5 Oak Ave",
            "specialty": "Dermatology"
        }))
        .unwrap();
        assert_eq!(record.name, "Dr. Lee");
        assert_eq!(record.address, "5 Oak Ave");
        assert_eq!(record.city, "");
        assert_eq!(record.classification, "Dermatology");
    }

    #[test]
    fn test_response_error_status() {
        let response: SearchResponse = serde_json::from_value(json!({
            "statusCode": 500,
            "result": "database unavailable"
        }))
        .unwrap();
        let err = response.into_records().unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[test]
    fn test_response_records() {
        let response: SearchResponse = serde_json::from_value(json!({
            "statusCode": 200,
            "result": [{"name": "A", "address": "1", "city": "X", "classification": "Y"}]
        }))
        .unwrap();
        assert_eq!(response.into_records().unwrap().len(), 1);
    }

    #[test]
    fn test_response_with_non_array_result() {
        let response = SearchResponse {
            status_code: 200,
            result: json!("oops"),
        };
        assert!(matches!(
            response.into_records(),
            Err(SearchError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_sample_fixture_filters() {
        let search = FixtureDoctorSearch::sample().unwrap();
        assert!(!search.is_empty());

        let query = SearchQuery {
            lastname: Some("smith".into()),
            zipcode: Some(10001),
            ..Default::default()
        };
        let records = search.search(&query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name.contains("Smith")));
    }

    #[tokio::test]
    async fn test_fixture_gender_and_specialty() {
        let search = FixtureDoctorSearch::from_json(
            r#"[
                {"name": "Dr. A Smith", "classification": "Cardiology", "zipcode": 10001, "gender": "female"},
                {"name": "Dr. B Smith", "classification": "Pediatrics", "zipcode": 10001, "gender": "male"}
            ]"#,
        )
        .unwrap();

        let female = SearchQuery {
            lastname: Some("Smith".into()),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        assert_eq!(search.search(&female).await.unwrap()[0].name, "Dr. A Smith");

        let pediatrics = SearchQuery {
            zipcode: Some(10001),
            specialty: Some("pediatric".into()),
            ..Default::default()
        };
        assert_eq!(search.search(&pediatrics).await.unwrap()[0].name, "Dr. B Smith");
    }

    #[test]
    fn test_load_missing_fixture_file() {
        let err = tokio_test::block_on(FixtureDoctorSearch::load("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, SearchError::Fixture { .. }));
    }
}

//! Result formatting: a human-readable listing plus a machine-readable summary.

use serde::{Deserialize, Serialize};

use crate::collaborator::DoctorRecord;
use crate::query::SearchQuery;

/// Text returned when a search matched nothing
pub const NO_RESULTS: &str = "No doctors found matching your search criteria.";

/// Machine-readable search outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub count: usize,
    pub doctors: Vec<DoctorRecord>,
    pub query: SearchQuery,
}

/// Render records as a numbered listing
pub fn format_results(records: &[DoctorRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }

    let header = match records.len() {
        1 => "Found 1 doctor matching your search:".to_string(),
        n => format!("Found {n} doctors matching your search:"),
    };

    let entries = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let record = record.trimmed();
            format!(
                "{}. {}\n   Address: {}, {}\n   Specialty: {}",
                i + 1,
                record.name,
                record.address,
                record.city,
                record.classification
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{header}\n\n{entries}")
}

/// Build the summary carried in the result artifact
pub fn summarize(records: &[DoctorRecord], query: &SearchQuery) -> SearchSummary {
    SearchSummary {
        count: records.len(),
        doctors: records.iter().map(DoctorRecord::trimmed).collect(),
        query: query.clone(),
    }
}

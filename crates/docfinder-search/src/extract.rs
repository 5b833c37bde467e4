//! Search parameter extraction.
//!
//! A message is turned into a [`SearchQuery`] in two ways. Structured input
//! wins: a `data` part (either `{"searchDoctors": {...}}` or the search fields
//! directly), then `message.metadata.searchDoctors`, then the request-level
//! `metadata.searchDoctors`. If there is none, or it does not validate, the
//! text parts are scanned with regular expressions.
//!
//! Everything here is pure; no I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use docfinder_a2a::{Message, Part};

use crate::query::{Gender, RequiredFields, SearchQuery, zipcode_in_range};

/// Key carrying structured search parameters
pub const SEARCH_KEY: &str = "searchDoctors";

const FIELD_KEYS: &[&str] = &[
    "zipcode",
    "zipCode",
    "zip",
    "lastname",
    "lastName",
    "last_name",
    "specialty",
    "gender",
];

static ZIPCODE: Lazy<Regex> = Lazy::new(|| compile(r"\b(\d{5})\b"));

static LASTNAME: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\b(?:last\s+name|lastname|named|name)\b\s*(?:is\b\s*|:\s*)?([a-z][a-z'\-]*)")
});

static GENDER: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(female|male)\b"));

static SPECIALTY: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)\b(?:specialty|speciali[sz]ing\s+in|field)\b(?:\s+(?:of|in|is)\b|\s*:)?\s*(.+?)\s*(?:\b(?:at|named)\b|\b(?:(?:in|near|around)\s+)?\d{5}\b|[.,;!?]|$)",
    )
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extraction pattern compiles")
}

/// Extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid search parameters: {}", .reasons.join("; "))]
    InvalidParameters { reasons: Vec<String> },
}

impl ExtractError {
    fn new(reasons: Vec<String>) -> Self {
        Self::InvalidParameters { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            ExtractError::InvalidParameters { reasons } => reasons,
        }
    }
}

/// Produce a validated query from a message and the request metadata
pub fn extract(
    message: &Message,
    request_metadata: &HashMap<String, Value>,
    policy: RequiredFields,
) -> Result<SearchQuery, ExtractError> {
    let structured_reasons = match structured_source(message, request_metadata) {
        Some(fields) => match from_structured(fields, policy) {
            Ok(query) => return Ok(query),
            Err(reasons) => Some(reasons),
        },
        None => None,
    };

    let candidate = parse_text(&message.text());
    if policy.is_satisfied_by(&candidate) {
        return Ok(candidate);
    }

    Err(ExtractError::new(
        structured_reasons.unwrap_or_else(|| vec![policy.requirement().to_string()]),
    ))
}

/// Scan free text for search fields. The result is not checked against any
/// policy; fields that do not match are left empty.
pub fn parse_text(text: &str) -> SearchQuery {
    let zipcode = ZIPCODE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|zip| zipcode_in_range(*zip));

    let lastname = LASTNAME
        .captures(text)
        .map(|caps| caps[1].trim_matches(['\'', '-']).to_string())
        .filter(|name| !name.is_empty());

    let gender = GENDER
        .captures(text)
        .and_then(|caps| caps[1].parse::<Gender>().ok());

    let specialty = SPECIALTY
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|specialty| !specialty.is_empty());

    SearchQuery {
        zipcode,
        lastname,
        specialty,
        gender,
    }
}

/// Find the first structured parameter object, in precedence order
fn structured_source<'a>(
    message: &'a Message,
    request_metadata: &'a HashMap<String, Value>,
) -> Option<&'a Map<String, Value>> {
    let from_parts = message.parts.iter().find_map(|part| match part {
        Part::Data(data) => data.data.as_object().and_then(|object| {
            match object.get(SEARCH_KEY).and_then(Value::as_object) {
                Some(inner) => Some(inner),
                None if FIELD_KEYS.iter().any(|key| object.contains_key(*key)) => Some(object),
                None => None,
            }
        }),
        Part::Text(_) => None,
    });

    from_parts
        .or_else(|| message.metadata.get(SEARCH_KEY).and_then(Value::as_object))
        .or_else(|| request_metadata.get(SEARCH_KEY).and_then(Value::as_object))
}

fn field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| fields.get(*key))
        .filter(|value| !value.is_null())
}

/// Validate a structured parameter object, collecting every problem
fn from_structured(
    fields: &Map<String, Value>,
    policy: RequiredFields,
) -> Result<SearchQuery, Vec<String>> {
    let mut reasons = Vec::new();
    let mut query = SearchQuery::default();

    if let Some(value) = field(fields, &["zipcode", "zipCode", "zip"]) {
        let zipcode = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) if s.trim().len() == 5 => s.trim().parse::<u32>().ok(),
            _ => None,
        };
        match zipcode.filter(|zip| zipcode_in_range(*zip)) {
            Some(zip) => query.zipcode = Some(zip),
            None => reasons.push(format!(
                "zipcode must be a 5-digit number between 10000 and 99999, got {value}"
            )),
        }
    }

    if let Some(value) = field(fields, &["lastname", "lastName", "last_name"]) {
        match value.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => query.lastname = Some(name.to_string()),
            _ => reasons.push("lastname must be a non-empty string".to_string()),
        }
    }

    if let Some(value) = field(fields, &["specialty"]) {
        match value.as_str().map(str::trim) {
            Some(specialty) if !specialty.is_empty() => {
                query.specialty = Some(specialty.to_string());
            }
            _ => reasons.push("specialty must be a non-empty string".to_string()),
        }
    }

    if let Some(value) = field(fields, &["gender"]) {
        match value.as_str().map(str::parse::<Gender>) {
            Some(Ok(gender)) => query.gender = Some(gender),
            Some(Err(reason)) => reasons.push(reason),
            None => reasons.push("gender must be 'male' or 'female'".to_string()),
        }
    }

    if reasons.is_empty() && !policy.is_satisfied_by(&query) {
        reasons.push(policy.requirement().to_string());
    }

    if reasons.is_empty() {
        Ok(query)
    } else {
        Err(reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn text_message(text: &str) -> Message {
        Message::user(text)
    }

    fn data_message(data: Value) -> Message {
        Message::new(docfinder_a2a::Role::User, vec![Part::data(data)])
    }

    fn run(message: &Message) -> Result<SearchQuery, ExtractError> {
        extract(message, &HashMap::new(), RequiredFields::default())
    }

    #[test]
    fn test_name_and_zip_from_text() {
        let query = run(&text_message("Find doctors named Smith in 10001")).unwrap();
        assert_eq!(
            query,
            SearchQuery {
                zipcode: Some(10001),
                lastname: Some("Smith".into()),
                specialty: None,
                gender: None,
            }
        );
    }

    #[rstest]
    #[case("doctors with last name Jones", "Jones")]
    #[case("lastname: O'Brien please", "O'Brien")]
    #[case("my doctor's name is Patel", "Patel")]
    #[case("LASTNAME garcia", "garcia")]
    fn test_lastname_patterns(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_text(text).lastname.as_deref(), Some(expected));
    }

    #[rstest]
    #[case("female cardiologist near 90210", Some(Gender::Female))]
    #[case("a MALE doctor", Some(Gender::Male))]
    #[case("any doctor", None)]
    fn test_gender(#[case] text: &str, #[case] expected: Option<Gender>) {
        assert_eq!(parse_text(text).gender, expected);
    }

    #[rstest]
    #[case("specialty cardiology at 10001", "cardiology")]
    #[case("specializing in family medicine, near me", "family medicine")]
    #[case("specialising in dermatology named Lee", "dermatology")]
    #[case("field of pediatrics", "pediatrics")]
    #[case("specialty: internal medicine", "internal medicine")]
    #[case("specialty cardiology in 10001", "cardiology")]
    #[case("female doctor with specialty cardiology in 94110", "cardiology")]
    #[case("specializing in pediatrics near 21140", "pediatrics")]
    #[case("field of dermatology 90210", "dermatology")]
    fn test_specialty_patterns(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_text(text).specialty.as_deref(), Some(expected));
    }

    #[test]
    fn test_zipcode_rules() {
        assert_eq!(parse_text("zip 02139").zipcode, None);
        assert_eq!(parse_text("call 1234567").zipcode, None);
        assert_eq!(parse_text("in 10001 or 20002").zipcode, Some(10001));
    }

    #[test]
    fn test_text_without_required_fields_fails() {
        let err = run(&text_message("I need a doctor")).unwrap_err();
        assert_eq!(err.reasons().len(), 1);
        assert!(err.to_string().contains("zipcode"));
    }

    #[test]
    fn test_specialty_only_depends_on_policy() {
        let message = text_message("specialty cardiology");
        assert!(run(&message).is_err());

        let query = extract(
            &message,
            &HashMap::new(),
            RequiredFields::ZipcodeLastnameOrSpecialty,
        )
        .unwrap();
        assert_eq!(query.specialty.as_deref(), Some("cardiology"));
    }

    #[test]
    fn test_structured_data_part() {
        let message = data_message(json!({
            "searchDoctors": {"zipcode": 10001, "gender": "FEMALE", "specialty": " Cardiology "}
        }));
        let query = run(&message).unwrap();
        assert_eq!(query.zipcode, Some(10001));
        assert_eq!(query.gender, Some(Gender::Female));
        assert_eq!(query.specialty.as_deref(), Some("Cardiology"));
    }

    #[test]
    fn test_bare_structured_fields() {
        let message = data_message(json!({"lastname": "Smith"}));
        assert_eq!(run(&message).unwrap().lastname.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_request_metadata_source() {
        let mut metadata = HashMap::new();
        metadata.insert(SEARCH_KEY.to_string(), json!({"zipcode": "94110"}));
        let query = extract(
            &text_message("anything"),
            &metadata,
            RequiredFields::default(),
        )
        .unwrap();
        assert_eq!(query.zipcode, Some(94110));
    }

    #[test]
    fn test_message_metadata_beats_request_metadata() {
        let mut message = text_message("anything");
        message
            .metadata
            .insert(SEARCH_KEY.to_string(), json!({"lastname": "Nguyen"}));
        let mut metadata = HashMap::new();
        metadata.insert(SEARCH_KEY.to_string(), json!({"lastname": "Other"}));

        let query = extract(&message, &metadata, RequiredFields::default()).unwrap();
        assert_eq!(query.lastname.as_deref(), Some("Nguyen"));
    }

    #[test]
    fn test_invalid_structured_falls_back_to_text() {
        let message = text_message("doctors named Brown").with_part(Part::data(json!({
            "searchDoctors": {"zipcode": 123}
        })));
        assert_eq!(run(&message).unwrap().lastname.as_deref(), Some("Brown"));
    }

    #[test]
    fn test_invalid_structured_reasons_are_reported() {
        let message = data_message(json!({
            "searchDoctors": {"zipcode": 123, "gender": "robot", "lastname": ""}
        }));
        let err = run(&message).unwrap_err();
        assert_eq!(err.reasons().len(), 3);
        assert!(err.to_string().contains("zipcode must be a 5-digit number"));
    }
}

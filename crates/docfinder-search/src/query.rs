//! Search query model and the minimum-field policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted zipcode
pub const ZIPCODE_MIN: u32 = 10000;

/// Largest accepted zipcode
pub const ZIPCODE_MAX: u32 = 99999;

/// Validated doctor search parameters. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.zipcode.is_none()
            && self.lastname.is_none()
            && self.specialty.is_none()
            && self.gender.is_none()
    }
}

/// Whether a zipcode falls in the five-digit range
pub fn zipcode_in_range(zipcode: u32) -> bool {
    (ZIPCODE_MIN..=ZIPCODE_MAX).contains(&zipcode)
}

/// Doctor gender filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("gender must be 'male' or 'female', got '{other}'")),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Which fields a query must carry before a search is attempted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequiredFields {
    /// A zipcode or a last name
    #[default]
    ZipcodeOrLastname,
    /// A zipcode, a last name, or a specialty
    ZipcodeLastnameOrSpecialty,
}

impl RequiredFields {
    pub fn is_satisfied_by(self, query: &SearchQuery) -> bool {
        let base = query.zipcode.is_some() || query.lastname.is_some();
        match self {
            RequiredFields::ZipcodeOrLastname => base,
            RequiredFields::ZipcodeLastnameOrSpecialty => base || query.specialty.is_some(),
        }
    }

    /// Human-readable statement of the requirement
    pub fn requirement(self) -> &'static str {
        match self {
            RequiredFields::ZipcodeOrLastname => {
                "a 5-digit zipcode or a doctor's last name is required"
            }
            RequiredFields::ZipcodeLastnameOrSpecialty => {
                "a 5-digit zipcode, a doctor's last name or a specialty is required"
            }
        }
    }
}

impl FromStr for RequiredFields {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zipcode-or-lastname" => Ok(RequiredFields::ZipcodeOrLastname),
            "zipcode-lastname-or-specialty" => Ok(RequiredFields::ZipcodeLastnameOrSpecialty),
            other => Err(format!(
                "unknown required-fields policy '{other}', expected \
                 zipcode-or-lastname or zipcode-lastname-or-specialty"
            )),
        }
    }
}

impl fmt::Display for RequiredFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredFields::ZipcodeOrLastname => write!(f, "zipcode-or-lastname"),
            RequiredFields::ZipcodeLastnameOrSpecialty => {
                write!(f, "zipcode-lastname-or-specialty")
            }
        }
    }
}

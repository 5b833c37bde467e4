//! Message and artifact parts, discriminated on the wire by `kind`.
//!
//! Only `text` and `data` parts are carried; file parts are not accepted by
//! the doctor search agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

type PartMetadata = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text(TextPart),
    Data(DataPart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart {
            text: text.into(),
            metadata: PartMetadata::new(),
        })
    }

    pub fn data(data: Value) -> Self {
        Self::Data(DataPart {
            data,
            metadata: PartMetadata::new(),
        })
    }

    /// Text payload, for `text` parts
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(part) = self {
            Some(part.text.as_str())
        } else {
            None
        }
    }

    /// JSON payload, for `data` parts
    pub fn as_data(&self) -> Option<&Value> {
        if let Self::Data(part) = self {
            Some(&part.data)
        } else {
            None
        }
    }
}

/// `{"kind": "text", "text": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: PartMetadata,
}

/// `{"kind": "data", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPart {
    pub data: Value,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: PartMetadata,
}

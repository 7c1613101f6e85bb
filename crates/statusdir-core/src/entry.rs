//! Directory entry and validator verdict types.
//!
//! Field names are serialized in camelCase because the persisted snapshot and
//! the read API both use the historical JSON contract (`lastSeen`, `errMsg`).

use serde::{Deserialize, Serialize};

/// One directory record for a single endpoint URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Endpoint URL, the immutable identity of the record.
    pub url: String,

    /// Result of the most recent validation attempt.
    #[serde(default)]
    pub valid: bool,

    /// Unix timestamp (seconds) of the last fetch that produced a document.
    ///
    /// Records "we could reach and parse this endpoint", not "it passed
    /// validation". Unset when the endpoint has never produced a document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,

    /// Human-readable error messages from the last attempt; empty when clean.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub err_msg: Vec<String>,

    /// The parsed document, present when the fetch returned any JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Entry {
    /// Create an empty entry for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Record an error message on the entry.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.err_msg.push(msg.into());
    }
}

/// A field-level problem reported by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub description: String,
}

impl FieldError {
    /// Flatten into the single-line form used in `Entry::err_msg`.
    pub fn message(&self) -> String {
        format!("{} {} {}", self.context, self.field, self.description)
    }
}

/// Structured validity verdict returned by the validator service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(default)]
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,

    /// The parsed document body, echoed back by the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_document: Option<serde_json::Value>,
}

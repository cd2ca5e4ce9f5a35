//! Canonical encoding for the tag and platform list columns.
//!
//! Clients have submitted these fields in three shapes over time: a JSON
//! array of strings, a comma-separated freeform string, and a string that
//! is itself JSON-array text. All of them normalize to one stored form,
//! JSON-array text, and everything read back decodes to a plain `Vec<String>`.
//! Both directions are total: malformed input encodes to `"[]"` and
//! malformed stored text decodes to an empty list.

use serde::Deserialize;

/// Canonical stored text for an empty list.
pub const EMPTY_LIST: &str = "[]";

/// List-ish client input for tag/platform fields, resolved once at the API
/// boundary instead of shape-sniffing in every caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    /// Multi-select widgets submit a real array
    Items(Vec<String>),
    /// Freeform text inputs submit one string, either comma-separated or
    /// pre-encoded JSON-array text
    Text(String),
}

impl ListInput {
    /// Resolve this input to its list of labels.
    ///
    /// Duplicates are dropped (union semantics, first occurrence wins), so
    /// the same label arriving from both a multi-select and a custom text
    /// field is stored once.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            ListInput::Items(items) => dedupe(items.iter().cloned()),
            ListInput::Text(text) => match serde_json::from_str::<serde_json::Value>(text) {
                Ok(serde_json::Value::Array(values)) => dedupe(
                    values
                        .into_iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string())),
                ),
                // Not JSON-array text: treat as comma-separated labels
                _ => dedupe(
                    text.split(',')
                        .map(|piece| piece.trim().to_string())
                        .filter(|piece| !piece.is_empty()),
                ),
            },
        }
    }
}

/// Encode list-ish input to canonical JSON-array text.
///
/// Absent input encodes to [`EMPTY_LIST`]; no input ever fails to encode.
pub fn encode(input: Option<&ListInput>) -> String {
    let items = input.map(ListInput::normalize).unwrap_or_default();
    serde_json::to_string(&items).unwrap_or_else(|_| EMPTY_LIST.to_string())
}

/// Encode an already-resolved list of labels.
pub fn encode_items(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| EMPTY_LIST.to_string())
}

/// Decode canonical stored text back to a list of labels.
///
/// Legacy rows may hold null, empty, or hand-edited text; anything that is
/// not a JSON array of strings decodes to an empty list, never an error.
pub fn decode(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Decode a nullable stored column.
pub fn decode_opt(raw: Option<&str>) -> Vec<String> {
    raw.map(decode).unwrap_or_default()
}

fn dedupe(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

//! NIP-11 relay information documents

use serde_json::Value;
use std::collections::BTreeSet;

/// A relay's self-description, parsed best-effort
///
/// Relays in the wild serve documents with missing fields, wrongly typed fields
/// or no JSON at all. Parsing never fails: each field is read independently and
/// anything that does not fit is left empty. The raw bytes are kept separately by
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoDocument {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Hex public key of the relay operator
    pub pubkey: Option<String>,
    pub contact: Option<String>,
    pub software: Option<String>,
    pub version: Option<String>,
    pub supported_nips: BTreeSet<u32>,
}

impl InfoDocument {
    /// Parses an information document from raw response bytes
    pub fn parse(bytes: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Information document is not JSON: {}", e);
                return Self::default();
            }
        };

        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let supported_nips = object
            .get("supported_nips")
            .and_then(Value::as_array)
            .map(|nips| nips.iter().filter_map(nip_number).collect())
            .unwrap_or_default();

        Self {
            name: text("name"),
            description: text("description"),
            pubkey: text("pubkey"),
            contact: text("contact"),
            software: text("software"),
            version: text("version"),
            supported_nips,
        }
    }
}

/// Accepts `11` as well as the occasional `"11"`
fn nip_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

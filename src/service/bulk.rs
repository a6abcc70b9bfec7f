use crate::catalog_store::timestamp_from_millis;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A candidate record of a bulk insert, as received on the wire.
///
/// Every field is optional here: records missing any of them are filtered
/// out before insertion. Any JSON value deserializes; a field of the wrong
/// type counts as missing, and `sharedAt` may also be epoch milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct BulkItem {
    pub url: Option<String>,
    pub title: Option<String>,
    pub shared_by: Option<String>,
    pub shared_at: Option<String>,
}

/// The string at `object[name]`, `None` when absent or not a string.
pub(crate) fn string_field(object: &Value, name: &str) -> Option<String> {
    object.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Millisecond timestamps become RFC 3339; any other non-string is kept as
/// its JSON text so it fails timestamp validation for that record alone.
fn shared_at_field(object: &Value) -> Option<String> {
    match object.get("sharedAt")? {
        Value::Null => None,
        Value::String(raw) => Some(raw.clone()),
        Value::Number(number) => Some(
            number
                .as_i64()
                .and_then(timestamp_from_millis)
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_else(|| number.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

impl From<Value> for BulkItem {
    fn from(object: Value) -> Self {
        BulkItem {
            url: string_field(&object, "url"),
            title: string_field(&object, "title"),
            shared_by: string_field(&object, "sharedBy"),
            shared_at: shared_at_field(&object),
        }
    }
}

impl BulkItem {
    pub fn new(url: &str, title: &str, shared_by: &str, shared_at: &str) -> Self {
        BulkItem {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            shared_by: Some(shared_by.to_string()),
            shared_at: Some(shared_at.to_string()),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        [&self.url, &self.title, &self.shared_by, &self.shared_at]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    pub url: String,
    pub error: String,
}

/// Summary returned by a bulk insert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total: usize,
    pub valid: usize,
    pub imported: usize,
    pub errors: Vec<BulkItemError>,
}

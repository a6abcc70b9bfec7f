use crate::catalog_store::{parse_timestamp, timestamp_from_millis};
use crate::service::{string_field, BulkItem};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// A record as found in the import file. `sharedAt` may be a string or
/// epoch milliseconds.
///
/// Any JSON value deserializes, so one malformed record never fails the whole
/// file: text fields of the wrong type read as missing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "Value")]
pub struct RawRecord {
    pub url: Option<String>,
    pub title: Option<String>,
    pub shared_by: Option<String>,
    pub shared_at: Option<Value>,
}

impl From<Value> for RawRecord {
    fn from(record: Value) -> Self {
        RawRecord {
            url: string_field(&record, "url"),
            title: string_field(&record, "title"),
            shared_by: string_field(&record, "sharedBy"),
            shared_at: record.get("sharedAt").cloned(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn canonical(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl RawRecord {
    pub fn url(&self) -> Option<&str> {
        present(&self.url)
    }

    pub fn title(&self) -> Option<&str> {
        present(&self.title)
    }

    pub fn shared_by(&self) -> Option<&str> {
        present(&self.shared_by)
    }

    /// `None` when absent, `Some(Err(raw))` when present but unparseable.
    pub fn shared_at_normalized(&self) -> Option<Result<String, String>> {
        let parsed = match self.shared_at.as_ref()? {
            Value::Null => return None,
            Value::String(raw) if raw.trim().is_empty() => return None,
            Value::String(raw) => parse_timestamp(raw).ok_or_else(|| raw.clone()),
            Value::Number(number) => number
                .as_i64()
                .and_then(timestamp_from_millis)
                .ok_or_else(|| number.to_string()),
            other => Err(other.to_string()),
        };
        Some(parsed.map(canonical))
    }

    /// The normalized item when every field is present and well formed.
    pub fn as_complete_item(&self) -> Option<BulkItem> {
        let shared_at = self.shared_at_normalized()?.ok()?;
        Some(BulkItem {
            url: Some(self.url()?.to_string()),
            title: Some(self.title()?.to_string()),
            shared_by: Some(self.shared_by()?.to_string()),
            shared_at: Some(shared_at),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("record has no url")]
    MissingUrl,

    #[error("title could not be resolved")]
    TitleUnresolved,

    #[error("invalid sharedAt: {0}")]
    InvalidSharedAt(String),

    #[error("missing sharedBy or sharedAt")]
    MissingFields,
}

fn serialize_display<S: Serializer>(reason: &SkipReason, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedRecord {
    pub url: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub reason: SkipReason,
}

impl SkippedRecord {
    pub fn new(url: Option<String>, reason: SkipReason) -> Self {
        SkippedRecord { url, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_at_accepts_strings_and_millis() {
        let record = RawRecord {
            shared_at: Some(Value::from(0i64)),
            ..Default::default()
        };
        assert_eq!(
            record.shared_at_normalized(),
            Some(Ok("1970-01-01T00:00:00.000Z".to_string()))
        );

        let record = RawRecord {
            shared_at: Some(Value::from("2024-05-06 07:08:09")),
            ..Default::default()
        };
        assert_eq!(
            record.shared_at_normalized(),
            Some(Ok("2024-05-06T07:08:09.000Z".to_string()))
        );
    }

    #[test]
    fn shared_at_rejects_other_shapes() {
        let record = RawRecord {
            shared_at: Some(Value::Bool(true)),
            ..Default::default()
        };
        assert_eq!(record.shared_at_normalized(), Some(Err("true".to_string())));

        let blank = RawRecord {
            shared_at: Some(Value::from("  ")),
            ..Default::default()
        };
        assert_eq!(blank.shared_at_normalized(), None);
    }

    #[test]
    fn wrongly_typed_text_fields_read_as_missing() {
        let records: Vec<RawRecord> = serde_json::from_str(
            r#"[{"url":123,"title":"T","sharedBy":"X","sharedAt":"2024-01-01"},
                {"url":"b","title":["T"],"sharedBy":null,"sharedAt":1704067200000},
                7]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].url(), None);
        assert_eq!(records[0].title(), Some("T"));
        assert_eq!(records[1].url(), Some("b"));
        assert_eq!(records[1].title(), None);
        assert_eq!(records[1].shared_by(), None);
        assert_eq!(
            records[1].shared_at_normalized(),
            Some(Ok("2024-01-01T00:00:00.000Z".to_string()))
        );
        assert!(records[2].url().is_none() && records[2].shared_at.is_none());
    }

    #[test]
    fn skipped_record_serializes_reason_as_text() {
        let skipped = SkippedRecord::new(Some("u".to_string()), SkipReason::TitleUnresolved);
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["reason"], "title could not be resolved");
    }
}

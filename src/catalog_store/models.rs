//! Catalog entry models and the value types used to query them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One persisted music-sharing record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub shared_by: Option<String>,
    #[serde(default, with = "timestamp_millis_option")]
    pub shared_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp_millis")]
    pub created_at: DateTime<Utc>,
}

/// A record about to be inserted, id and creation time are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMusicEntry {
    pub url: String,
    pub title: String,
    pub shared_by: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
}

/// Order of listings by creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    /// Anything other than "oldest" means newest first.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("oldest") => SortOrder::Oldest,
            _ => SortOrder::Newest,
        }
    }

    pub fn as_query(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Newest,
        }
    }

    pub(crate) fn sql_direction(&self) -> &'static str {
        match self {
            SortOrder::Newest => "DESC",
            SortOrder::Oldest => "ASC",
        }
    }
}

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicPage {
    pub music: Vec<MusicEntry>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Outcome of inserting a single record of an unordered batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(MusicEntry),
    Failed { url: String, error: String },
}

/// Parses the timestamp formats accepted for `sharedAt`.
///
/// RFC 3339, naive date-times (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Serializes timestamps as RFC 3339 with millisecond precision.
mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp {}", raw)))
    }
}

mod timestamp_millis_option {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => {
                serializer.serialize_some(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {}", raw))),
            None => Ok(None),
        }
    }
}

//! JSON bodies exchanged on the `/api/music` surface.

use crate::catalog_store::MusicEntry;
use crate::service::BulkItem;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicListResponse {
    pub music: Vec<MusicEntry>,
}

/// `music` is null when the catalog is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomMusicResponse {
    pub music: Option<MusicEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreateRequest {
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server overview returned by `GET /` when no frontend is served.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub entries_count: usize,
}

//! What a feed renders: cards, affordances and aggregate stats.

use crate::catalog_store::MusicEntry;
use crate::resolver::{cover_url, Provider};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCard {
    pub id: String,
    pub url: String,
    /// Falls back to the url when the entry has no title.
    pub title: String,
    pub shared_by: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
    pub provider: Provider,
    pub cover_url: String,
}

impl From<&MusicEntry> for FeedCard {
    fn from(entry: &MusicEntry) -> Self {
        let title = if entry.title.trim().is_empty() {
            entry.url.clone()
        } else {
            entry.title.clone()
        };
        FeedCard {
            id: entry.id.clone(),
            url: entry.url.clone(),
            title,
            shared_by: entry.shared_by.clone(),
            shared_at: entry.shared_at,
            provider: Provider::classify(&entry.url),
            cover_url: cover_url(&entry.url),
        }
    }
}

/// The control shown below the rendered list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Affordance {
    #[default]
    None,
    ShowMore,
    Retry(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FeedMode {
    #[default]
    Browse,
    Search(String),
}

/// What asked for a page load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadTrigger {
    InitialMount,
    SortToggle,
    SearchClear,
    ScrollSentinel,
    ShowMoreClick,
    NewSubmission,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    /// Sharers by number of entries, most active first.
    pub per_sharer: Vec<(String, usize)>,
    pub per_provider: Vec<(Provider, usize)>,
}

pub const ANONYMOUS_SHARER: &str = "Anonymous";

impl CatalogStats {
    pub fn from_entries(entries: &[MusicEntry]) -> Self {
        let mut sharers: HashMap<&str, usize> = HashMap::new();
        let mut providers: HashMap<Provider, usize> = HashMap::new();
        for entry in entries {
            let sharer = entry
                .shared_by
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(ANONYMOUS_SHARER);
            *sharers.entry(sharer).or_default() += 1;
            *providers.entry(Provider::classify(&entry.url)).or_default() += 1;
        }

        let mut per_sharer: Vec<(String, usize)> = sharers
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        per_sharer.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let per_provider = [Provider::YouTube, Provider::Spotify, Provider::Unknown]
            .into_iter()
            .filter_map(|p| providers.get(&p).map(|count| (p, *count)))
            .collect();

        CatalogStats {
            total: entries.len(),
            per_sharer,
            per_provider,
        }
    }
}

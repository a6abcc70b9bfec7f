//! Catalog operations on top of any [`CatalogStore`].
//!
//! The service holds no state of its own besides the store handle and the
//! bulk batch size; every call maps to one or a few store queries.

use super::bulk::{BulkItem, BulkItemError, BulkSummary};
use crate::catalog_store::{
    parse_timestamp, require_non_empty, CatalogStore, InsertOutcome, MusicEntry, MusicPage,
    NewMusicEntry, SortOrder, ValidationError,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const SEARCH_RESULTS_LIMIT: usize = 100;
pub const DEFAULT_BULK_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store failure: {0:#}")]
    Store(anyhow::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Body of a single insert. `sharedBy` and `sharedAt` may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMusicRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_at: Option<String>,
}

/// Parses a positive integer query value, falling back to `default` for
/// anything missing, non-numeric, zero or negative.
pub fn coerce_positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_shared_at(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, ValidationError> {
    parse_timestamp(raw).ok_or_else(|| ValidationError::InvalidTimestamp {
        field: "sharedAt",
        value: raw.to_string(),
    })
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    bulk_batch_size: usize,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self::with_batch_size(store, DEFAULT_BULK_BATCH_SIZE)
    }

    pub fn with_batch_size(store: Arc<dyn CatalogStore>, bulk_batch_size: usize) -> Self {
        CatalogService {
            store,
            bulk_batch_size: bulk_batch_size.max(1),
        }
    }

    fn store_error(operation: &str, err: anyhow::Error) -> CatalogError {
        error!("{} failed: {:#}", operation, err);
        CatalogError::Store(err)
    }

    pub fn count(&self) -> CatalogResult<usize> {
        self.store
            .count()
            .map_err(|e| Self::store_error("count", e))
    }

    /// One page of the catalog. Zero `page` or `limit` fall back to the defaults.
    pub fn list_page(&self, page: usize, limit: usize, sort: SortOrder) -> CatalogResult<MusicPage> {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let limit = if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit };

        let total_items = self.count()?;
        let offset = (page - 1).saturating_mul(limit);
        let music = if offset >= total_items {
            vec![]
        } else {
            self.store
                .list_page(offset, limit, sort)
                .map_err(|e| Self::store_error("list_page", e))?
        };

        Ok(MusicPage {
            music,
            current_page: page,
            total_pages: total_items.div_ceil(limit),
            total_items,
        })
    }

    pub fn list_all(&self) -> CatalogResult<Vec<MusicEntry>> {
        self.store
            .list_all(SortOrder::Newest)
            .map_err(|e| Self::store_error("list_all", e))
    }

    pub fn create(&self, request: CreateMusicRequest) -> CatalogResult<MusicEntry> {
        let url = require_non_empty("url", request.url.as_deref().unwrap_or_default())?;
        let title = require_non_empty("title", request.title.as_deref().unwrap_or_default())?;
        let shared_at = match non_blank(request.shared_at) {
            Some(raw) => Some(parse_shared_at(&raw)?),
            None => None,
        };

        let entry = self
            .store
            .insert(NewMusicEntry {
                url,
                title,
                shared_by: non_blank(request.shared_by),
                shared_at,
            })
            .map_err(|e| Self::store_error("create", e))?;
        debug!("Created music entry {} ({})", entry.id, entry.url);
        Ok(entry)
    }

    /// Inserts every complete item, batch after batch, never stopping at a
    /// failing record.
    pub fn bulk_create(&self, items: Vec<BulkItem>) -> CatalogResult<BulkSummary> {
        let total = items.len();
        let valid_items: Vec<BulkItem> = items.into_iter().filter(BulkItem::is_complete).collect();
        if valid_items.is_empty() {
            return Err(ValidationError::NoValidItems.into());
        }

        let mut summary = BulkSummary {
            total,
            valid: valid_items.len(),
            imported: 0,
            errors: vec![],
        };

        for batch in valid_items.chunks(self.bulk_batch_size) {
            let mut entries = Vec::with_capacity(batch.len());
            for item in batch {
                let url = item.url.clone().unwrap_or_default().trim().to_string();
                let shared_at = item.shared_at.as_deref().unwrap_or_default().trim();
                match parse_shared_at(shared_at) {
                    Ok(shared_at) => entries.push(NewMusicEntry {
                        url,
                        title: item.title.clone().unwrap_or_default().trim().to_string(),
                        shared_by: non_blank(item.shared_by.clone()),
                        shared_at: Some(shared_at),
                    }),
                    Err(err) => summary.errors.push(BulkItemError {
                        url,
                        error: err.to_string(),
                    }),
                }
            }

            let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
            match self.store.insert_unordered(entries) {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            InsertOutcome::Inserted(_) => summary.imported += 1,
                            InsertOutcome::Failed { url, error } => {
                                error!("Bulk insert of {} failed: {}", url, error);
                                summary.errors.push(BulkItemError { url, error });
                            }
                        }
                    }
                }
                Err(err) => {
                    error!("Bulk batch insert failed: {:#}", err);
                    summary
                        .errors
                        .extend(urls.into_iter().map(|url| BulkItemError {
                            url,
                            error: format!("{:#}", err),
                        }));
                }
            }
        }

        info!(
            "Bulk import: {} total, {} valid, {} imported, {} errors",
            summary.total,
            summary.valid,
            summary.imported,
            summary.errors.len()
        );
        Ok(summary)
    }

    pub fn search(&self, query: &str, sort: SortOrder) -> CatalogResult<Vec<MusicEntry>> {
        let query = require_non_empty("q", query).map_err(|_| ValidationError::EmptyQuery)?;
        self.store
            .search(&query, SEARCH_RESULTS_LIMIT, sort)
            .map_err(|e| Self::store_error("search", e))
    }

    /// A uniformly chosen entry, `None` when the catalog is empty.
    pub fn random_one(&self) -> CatalogResult<Option<MusicEntry>> {
        let count = self.count()?;
        if count == 0 {
            return Ok(None);
        }
        let offset = rand::rng().random_range(0..count);
        self.store
            .entry_at(offset)
            .map_err(|e| Self::store_error("random_one", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory store that refuses a chosen set of urls.
    #[derive(Default)]
    struct FakeStore {
        entries: Mutex<Vec<MusicEntry>>,
        failing_urls: HashSet<String>,
        batch_sizes: Mutex<Vec<usize>>,
        broken: bool,
    }

    impl FakeStore {
        fn failing(urls: &[&str]) -> Self {
            FakeStore {
                failing_urls: urls.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }

        fn sorted(&self, sort: SortOrder) -> Vec<MusicEntry> {
            let mut entries = self.entries.lock().unwrap().clone();
            if sort == SortOrder::Newest {
                entries.reverse();
            }
            entries
        }
    }

    impl CatalogStore for FakeStore {
        fn count(&self) -> Result<usize> {
            if self.broken {
                bail!("disk on fire");
            }
            Ok(self.entries.lock().unwrap().len())
        }

        fn list_page(&self, offset: usize, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>> {
            Ok(self.sorted(sort).into_iter().skip(offset).take(limit).collect())
        }

        fn list_all(&self, sort: SortOrder) -> Result<Vec<MusicEntry>> {
            Ok(self.sorted(sort))
        }

        fn insert(&self, entry: NewMusicEntry) -> Result<MusicEntry> {
            if self.failing_urls.contains(&entry.url) {
                bail!("duplicate key {}", entry.url);
            }
            let mut entries = self.entries.lock().unwrap();
            let created = MusicEntry {
                id: format!("id-{}", entries.len()),
                url: entry.url,
                title: entry.title,
                shared_by: entry.shared_by,
                shared_at: entry.shared_at,
                created_at: chrono::Utc::now(),
            };
            entries.push(created.clone());
            Ok(created)
        }

        fn insert_unordered(&self, entries: Vec<NewMusicEntry>) -> Result<Vec<InsertOutcome>> {
            self.batch_sizes.lock().unwrap().push(entries.len());
            Ok(entries
                .into_iter()
                .map(|entry| {
                    let url = entry.url.clone();
                    match self.insert(entry) {
                        Ok(inserted) => InsertOutcome::Inserted(inserted),
                        Err(e) => InsertOutcome::Failed {
                            url,
                            error: e.to_string(),
                        },
                    }
                })
                .collect())
        }

        fn search(&self, query: &str, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>> {
            let query = query.to_lowercase();
            Ok(self
                .sorted(sort)
                .into_iter()
                .filter(|e| {
                    e.title.to_lowercase().contains(&query)
                        || e.shared_by
                            .as_deref()
                            .is_some_and(|s| s.to_lowercase().contains(&query))
                })
                .take(limit)
                .collect())
        }

        fn entry_at(&self, offset: usize) -> Result<Option<MusicEntry>> {
            Ok(self.sorted(SortOrder::Newest).into_iter().nth(offset))
        }
    }

    fn service_with(store: FakeStore) -> (Arc<FakeStore>, CatalogService) {
        let store = Arc::new(store);
        (store.clone(), CatalogService::with_batch_size(store, 2))
    }

    fn create_request(url: &str, title: &str) -> CreateMusicRequest {
        CreateMusicRequest {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_coerce_positive() {
        assert_eq!(coerce_positive(None, 10), 10);
        assert_eq!(coerce_positive(Some("abc"), 10), 10);
        assert_eq!(coerce_positive(Some("0"), 10), 10);
        assert_eq!(coerce_positive(Some("-3"), 10), 10);
        assert_eq!(coerce_positive(Some(" 7 "), 10), 7);
    }

    #[test]
    fn test_list_page_computes_totals() {
        let (_, service) = service_with(FakeStore::default());
        for i in 0..25 {
            service.create(create_request("https://u", &format!("T{}", i))).unwrap();
        }

        let page = service.list_page(3, 10, SortOrder::Newest).unwrap();
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.music.len(), 5);
        assert_eq!(page.music[0].title, "T4");

        let beyond = service.list_page(4, 10, SortOrder::Newest).unwrap();
        assert!(beyond.music.is_empty());
        assert_eq!(beyond.total_pages, 3);

        let defaulted = service.list_page(0, 0, SortOrder::Oldest).unwrap();
        assert_eq!(defaulted.current_page, 1);
        assert_eq!(defaulted.music.len(), 10);
        assert_eq!(defaulted.music[0].title, "T0");
    }

    #[test]
    fn test_empty_catalog_page() {
        let (_, service) = service_with(FakeStore::default());
        let page = service.list_page(1, 10, SortOrder::Newest).unwrap();
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.music.is_empty());
    }

    #[test]
    fn test_create_validates_fields() {
        let (store, service) = service_with(FakeStore::default());

        let missing_title = service.create(CreateMusicRequest {
            url: Some("https://u".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            missing_title,
            Err(CatalogError::Validation(ValidationError::EmptyField { field: "title" }))
        ));

        let bad_date = service.create(CreateMusicRequest {
            shared_at: Some("not a date".to_string()),
            ..create_request("https://u", "T")
        });
        assert!(matches!(
            bad_date,
            Err(CatalogError::Validation(ValidationError::InvalidTimestamp { .. }))
        ));

        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_create_trims_and_keeps_attribution() {
        let (_, service) = service_with(FakeStore::default());
        let entry = service
            .create(CreateMusicRequest {
                shared_by: Some(" Bob ".to_string()),
                shared_at: Some("2024-01-01".to_string()),
                ..create_request("  https://youtu.be/dQw4w9WgXcQ ", " Song ")
            })
            .unwrap();

        assert_eq!(entry.url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(entry.title, "Song");
        assert_eq!(entry.shared_by.as_deref(), Some("Bob"));
        assert_eq!(entry.shared_at, parse_timestamp("2024-01-01"));
    }

    #[test]
    fn test_bulk_create_filters_incomplete_items() {
        let (_, service) = service_with(FakeStore::default());
        let summary = service
            .bulk_create(vec![
                BulkItem {
                    url: Some("a".to_string()),
                    ..Default::default()
                },
                BulkItem::new("b", "T", "X", "2024-01-01"),
            ])
            .unwrap();

        assert_eq!(
            summary,
            BulkSummary {
                total: 2,
                valid: 1,
                imported: 1,
                errors: vec![],
            }
        );
    }

    #[test]
    fn test_bulk_create_without_valid_items_fails() {
        let (_, service) = service_with(FakeStore::default());
        let result = service.bulk_create(vec![BulkItem::default()]);
        assert!(matches!(
            result,
            Err(CatalogError::Validation(ValidationError::NoValidItems))
        ));
    }

    #[test]
    fn test_bulk_create_continues_past_failures_across_batches() {
        let (store, service) = service_with(FakeStore::failing(&["u1", "u3"]));
        let items = (0..5)
            .map(|i| BulkItem::new(&format!("u{}", i), "T", "X", "2024-01-01"))
            .chain(std::iter::once(BulkItem::new("u5", "T", "X", "garbage")))
            .collect();

        let summary = service.bulk_create(items).unwrap();

        assert_eq!(summary.total, 6);
        assert_eq!(summary.valid, 6);
        assert_eq!(summary.imported, 3);
        let failed: Vec<&str> = summary.errors.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(failed, vec!["u1", "u3", "u5"]);
        assert_eq!(*store.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    }

    #[test]
    fn test_search_rejects_empty_query() {
        let (_, service) = service_with(FakeStore::default());
        assert!(matches!(
            service.search("   ", SortOrder::Newest),
            Err(CatalogError::Validation(ValidationError::EmptyQuery))
        ));
    }

    #[test]
    fn test_search_matches_sharer_substring() {
        let (_, service) = service_with(FakeStore::default());
        service
            .create(CreateMusicRequest {
                shared_by: Some("Bob The Builder".to_string()),
                ..create_request("https://a", "Can we fix it")
            })
            .unwrap();
        service.create(create_request("https://b", "Other")).unwrap();

        let results = service.search("Bob", SortOrder::Newest).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://a");
    }

    #[test]
    fn test_random_one() {
        let (_, service) = service_with(FakeStore::default());
        assert!(service.random_one().unwrap().is_none());

        service.create(create_request("https://a", "A")).unwrap();
        service.create(create_request("https://b", "B")).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(service.random_one().unwrap().unwrap().url);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_store_failure_is_reported() {
        let (_, service) = service_with(FakeStore {
            broken: true,
            ..Default::default()
        });
        let err = service.list_page(1, 10, SortOrder::Newest).unwrap_err();
        assert!(matches!(err, CatalogError::Store(_)));
        assert!(err.to_string().contains("disk on fire"));
    }
}

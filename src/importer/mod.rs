//! Offline bulk import of raw music records.
//!
//! Records are normalized one by one (missing titles are resolved, share
//! times validated) and every accepted record is submitted in a single bulk
//! insert through a [`BulkSink`].

mod record;
mod sink;

pub use record::{RawRecord, SkipReason, SkippedRecord};
pub use sink::BulkSink;

use crate::resolver::TitleResolver;
use crate::service::{BulkItem, BulkSummary};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of an import run.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub read: usize,
    pub accepted: usize,
    pub skipped: Vec<SkippedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BulkSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_error: Option<String>,
}

/// Reads a JSON array of raw records. This is the only fatal step of an
/// import: it fails on unreadable files or input that is not an array, never
/// on the contents of a single record.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file {:?}", path))
}

pub struct BulkImporter {
    resolver: Arc<dyn TitleResolver>,
}

impl BulkImporter {
    pub fn new(resolver: Arc<dyn TitleResolver>) -> Self {
        BulkImporter { resolver }
    }

    /// Turns one raw record into a complete bulk item, or explains why not.
    pub async fn normalize(&self, record: RawRecord) -> Result<BulkItem, SkippedRecord> {
        if let Some(item) = record.as_complete_item() {
            return Ok(item);
        }

        let url = match record.url() {
            Some(url) => url.to_string(),
            None => return Err(SkippedRecord::new(None, SkipReason::MissingUrl)),
        };

        let title = match record.title() {
            Some(title) => title.to_string(),
            None => match self.resolver.resolve_title(&url).await {
                Some(title) => title,
                None => return Err(SkippedRecord::new(Some(url), SkipReason::TitleUnresolved)),
            },
        };

        let shared_at = match record.shared_at_normalized() {
            Some(Ok(shared_at)) => Some(shared_at),
            Some(Err(raw)) => {
                return Err(SkippedRecord::new(
                    Some(url),
                    SkipReason::InvalidSharedAt(raw),
                ))
            }
            None => None,
        };

        match (record.shared_by(), shared_at) {
            (Some(shared_by), Some(shared_at)) => Ok(BulkItem {
                url: Some(url),
                title: Some(title),
                shared_by: Some(shared_by.to_string()),
                shared_at: Some(shared_at),
            }),
            _ => Err(SkippedRecord::new(Some(url), SkipReason::MissingFields)),
        }
    }

    /// Normalizes records in order, one at a time.
    pub async fn prepare(
        &self,
        records: Vec<RawRecord>,
        progress: &ProgressBar,
    ) -> (Vec<BulkItem>, Vec<SkippedRecord>) {
        let mut accepted = Vec::with_capacity(records.len());
        let mut skipped = vec![];
        for record in records {
            match self.normalize(record).await {
                Ok(item) => accepted.push(item),
                Err(skip) => {
                    warn!(
                        "Skipping record {}: {}",
                        skip.url.as_deref().unwrap_or("<no url>"),
                        skip.reason
                    );
                    skipped.push(skip);
                }
            }
            progress.inc(1);
        }
        (accepted, skipped)
    }

    /// Normalizes `records` and submits the accepted ones in one call.
    ///
    /// Nothing is submitted when no record is accepted. A failing submission is
    /// reported, not returned as an error.
    pub async fn run(
        &self,
        records: Vec<RawRecord>,
        sink: &dyn BulkSink,
        progress: &ProgressBar,
    ) -> ImportReport {
        let read = records.len();
        let (accepted, skipped) = self.prepare(records, progress).await;
        let mut report = ImportReport {
            read,
            accepted: accepted.len(),
            skipped,
            ..Default::default()
        };

        if accepted.is_empty() {
            info!("No records to import");
            return report;
        }

        info!("Submitting {} records", accepted.len());
        match sink.bulk_create(accepted).await {
            Ok(summary) => report.summary = Some(summary),
            Err(err) => {
                error!("Bulk submission failed: {:#}", err);
                report.submit_error = Some(format!("{:#}", err));
            }
        }
        report
    }
}

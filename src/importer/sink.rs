use crate::service::{BulkItem, BulkSummary, CatalogService};
use anyhow::Result;
use async_trait::async_trait;

/// Destination of an import: the REST API or a local catalog.
#[async_trait]
pub trait BulkSink: Send + Sync {
    async fn bulk_create(&self, items: Vec<BulkItem>) -> Result<BulkSummary>;
}

#[async_trait]
impl BulkSink for CatalogService {
    async fn bulk_create(&self, items: Vec<BulkItem>) -> Result<BulkSummary> {
        let service = self.clone();
        let summary = tokio::task::spawn_blocking(move || service.bulk_create(items)).await??;
        Ok(summary)
    }
}

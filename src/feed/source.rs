use crate::catalog_store::{MusicEntry, MusicPage, SortOrder};
use crate::service::CreateMusicRequest;
use anyhow::Result;
use async_trait::async_trait;

/// The read and write queries a feed issues against the catalog.
///
/// Each call is one network round trip; errors are surfaced to the user as a
/// retry affordance, never propagated further.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn list_page(&self, page: usize, limit: usize, sort: SortOrder) -> Result<MusicPage>;

    async fn list_all(&self) -> Result<Vec<MusicEntry>>;

    async fn search(&self, query: &str, sort: SortOrder) -> Result<Vec<MusicEntry>>;

    async fn create(&self, request: CreateMusicRequest) -> Result<MusicEntry>;

    async fn random_one(&self) -> Result<Option<MusicEntry>>;
}

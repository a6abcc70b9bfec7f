//! CatalogStore trait definition.

use super::models::{InsertOutcome, MusicEntry, NewMusicEntry, SortOrder};
use anyhow::Result;

/// Trait for catalog storage backends.
///
/// Entries are append-only: there is no update or delete operation.
pub trait CatalogStore: Send + Sync {
    /// Total number of entries.
    fn count(&self) -> Result<usize>;

    /// Entries ordered by creation time, skipping `offset` and returning at most `limit`.
    fn list_page(&self, offset: usize, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>>;

    /// Every entry, ordered by creation time.
    fn list_all(&self, sort: SortOrder) -> Result<Vec<MusicEntry>>;

    /// Persist a single entry, assigning its id and creation time.
    fn insert(&self, entry: NewMusicEntry) -> Result<MusicEntry>;

    /// Persist a batch of entries without stopping at the first failure.
    ///
    /// Returns one outcome per input entry, in input order. An `Err` means the
    /// batch as a whole could not be attempted.
    fn insert_unordered(&self, entries: Vec<NewMusicEntry>) -> Result<Vec<InsertOutcome>>;

    /// Case-insensitive substring match against title or sharer.
    fn search(&self, query: &str, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>>;

    /// The entry at `offset` in newest-first order.
    fn entry_at(&self, offset: usize) -> Result<Option<MusicEntry>>;
}

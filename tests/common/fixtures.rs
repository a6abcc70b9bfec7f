//! Test database creation

use super::constants::*;
use anyhow::Result;
use music_share_server::catalog_store::{
    parse_timestamp, CatalogStore, InsertOutcome, NewMusicEntry, SqliteCatalogStore,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn seeded(url: &str, title: &str, shared_by: &str, shared_at: &str) -> NewMusicEntry {
    NewMusicEntry {
        url: url.to_string(),
        title: title.to_string(),
        shared_by: Some(shared_by.to_string()),
        shared_at: parse_timestamp(shared_at),
    }
}

/// Inserts the seeded songs in order, so the last one is the newest.
pub fn seed_entries(store: &dyn CatalogStore) -> Result<()> {
    let outcomes = store.insert_unordered(vec![
        seeded(SONG_1_URL, SONG_1_TITLE, SONG_1_SHARED_BY, SONG_1_SHARED_AT),
        seeded(SONG_2_URL, SONG_2_TITLE, SONG_2_SHARED_BY, SONG_2_SHARED_AT),
        seeded(SONG_3_URL, SONG_3_TITLE, SONG_3_SHARED_BY, SONG_3_SHARED_AT),
    ])?;
    for outcome in outcomes {
        if let InsertOutcome::Failed { url, error } = outcome {
            anyhow::bail!("Failed to seed {}: {}", url, error);
        }
    }
    Ok(())
}

/// Creates a temporary music database holding the seeded songs.
///
/// The TempDir must be kept alive for as long as the database is used.
pub fn create_test_db() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("music.db");
    let store = SqliteCatalogStore::new(&db_path, 1)?;
    seed_entries(&store)?;
    Ok((dir, db_path))
}

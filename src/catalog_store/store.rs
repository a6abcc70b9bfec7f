//! SQLite-backed catalog store.
//!
//! Writes go through a single connection behind a mutex, reads are spread
//! over a small round-robin pool of read-only connections. The database runs
//! in WAL mode so readers never block the writer.

use super::models::{timestamp_from_millis, InsertOutcome, MusicEntry, NewMusicEntry, SortOrder};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use super::validation::validate_new_entry;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const ENTRY_COLUMNS: &str = "id, url, title, shared_by, shared_at, created_at";

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Catalog db has user_version {}, which is not a known catalog schema",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!(
            "Catalog db is at version {}, newer than the latest known version {}",
            current_version,
            latest_version
        );
    }

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating catalog db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Catalog db schema validation failed")?;
    Ok(())
}

fn row_to_entry(row: &Row) -> rusqlite::Result<MusicEntry> {
    let shared_at = match row.get::<_, Option<i64>>(4)? {
        Some(millis) => Some(
            timestamp_from_millis(millis)
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, millis))?,
        ),
        None => None,
    };
    let created_millis: i64 = row.get(5)?;
    let created_at = timestamp_from_millis(created_millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(5, created_millis))?;

    Ok(MusicEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        shared_by: row.get(3)?,
        shared_at,
        created_at,
    })
}

/// Escapes LIKE wildcards so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn last_created_at(conn: &Connection) -> Result<i64> {
    let last: Option<i64> = conn.query_row("SELECT MAX(created_at) FROM music", [], |r| r.get(0))?;
    Ok(last.unwrap_or(i64::MIN))
}

/// Inserts one already-validated entry stamped with `created_millis`.
fn insert_entry(conn: &Connection, entry: NewMusicEntry, created_millis: i64) -> Result<MusicEntry> {
    let id = uuid::Uuid::new_v4().to_string();
    let shared_at_millis = entry.shared_at.map(|t| t.timestamp_millis());
    conn.prepare_cached(
        "INSERT INTO music (id, url, title, created_at, shared_by, shared_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        id,
        entry.url,
        entry.title,
        created_millis,
        entry.shared_by,
        shared_at_millis
    ])?;

    let created_at = timestamp_from_millis(created_millis)
        .with_context(|| format!("Invalid creation time {}", created_millis))?;
    Ok(MusicEntry {
        id,
        url: entry.url,
        title: entry.title,
        shared_by: entry.shared_by,
        shared_at: entry.shared_at,
        created_at,
    })
}

impl SqliteCatalogStore {
    /// Opens (creating if needed) the catalog database at `db_path`.
    ///
    /// * `read_pool_size` - Number of connections for concurrent read operations
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path_ref))?;

        migrate_if_needed(&mut write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let entries_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM music", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened music catalog: {} entries", entries_count);

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn query_entries<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<MusicEntry>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let entries = stmt
            .query_map(params, row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn count(&self) -> Result<usize> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM music", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn list_page(&self, offset: usize, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>> {
        let dir = sort.sql_direction();
        self.query_entries(
            &format!(
                "SELECT {} FROM music ORDER BY created_at {}, rowid {} LIMIT ?1 OFFSET ?2",
                ENTRY_COLUMNS, dir, dir
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn list_all(&self, sort: SortOrder) -> Result<Vec<MusicEntry>> {
        let dir = sort.sql_direction();
        self.query_entries(
            &format!(
                "SELECT {} FROM music ORDER BY created_at {}, rowid {}",
                ENTRY_COLUMNS, dir, dir
            ),
            [],
        )
    }

    fn insert(&self, entry: NewMusicEntry) -> Result<MusicEntry> {
        validate_new_entry(&entry)?;
        let conn = self.write_conn.lock().unwrap();
        let created_millis = Utc::now().timestamp_millis().max(last_created_at(&conn)?);
        let inserted = insert_entry(&conn, entry, created_millis)?;
        debug!("Inserted music entry {}", inserted.id);
        Ok(inserted)
    }

    fn insert_unordered(&self, entries: Vec<NewMusicEntry>) -> Result<Vec<InsertOutcome>> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;
        let created_millis = Utc::now().timestamp_millis().max(last_created_at(&tx)?);

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let url = entry.url.clone();
            let outcome = validate_new_entry(&entry)
                .map_err(anyhow::Error::from)
                .and_then(|_| insert_entry(&tx, entry, created_millis));
            outcomes.push(match outcome {
                Ok(inserted) => InsertOutcome::Inserted(inserted),
                Err(err) => InsertOutcome::Failed {
                    url,
                    error: err.to_string(),
                },
            });
        }
        tx.commit()?;
        Ok(outcomes)
    }

    fn search(&self, query: &str, limit: usize, sort: SortOrder) -> Result<Vec<MusicEntry>> {
        let dir = sort.sql_direction();
        self.query_entries(
            &format!(
                "SELECT {} FROM music \
                 WHERE title LIKE ?1 ESCAPE '\\' OR shared_by LIKE ?1 ESCAPE '\\' \
                 ORDER BY created_at {}, rowid {} LIMIT ?2",
                ENTRY_COLUMNS, dir, dir
            ),
            params![like_pattern(query), limit as i64],
        )
    }

    fn entry_at(&self, offset: usize) -> Result<Option<MusicEntry>> {
        let mut entries = self.query_entries(
            &format!(
                "SELECT {} FROM music ORDER BY created_at DESC, rowid DESC LIMIT 1 OFFSET ?1",
                ENTRY_COLUMNS
            ),
            params![offset as i64],
        )?;
        Ok(entries.pop())
    }
}

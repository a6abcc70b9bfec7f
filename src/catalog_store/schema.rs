//! SQLite schema definitions for the music catalog database.
//!
//! Entries are keyed by an integer rowid, which doubles as the insertion
//! sequence used to break `created_at` ties. Timestamps are stored as epoch
//! milliseconds.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use anyhow::Result;
use rusqlite::Connection;

// =============================================================================
// Version 0 - url and title only
// =============================================================================

const MUSIC_TABLE_V0: Table = Table {
    name: "music",
    columns: &[
        sqlite_column!("rowid", SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", SqlType::Text, non_null = true), // uuid v4
        sqlite_column!("url", SqlType::Text, non_null = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_music_created_at", "created_at")],
    unique_constraints: &[&["id"]],
};

// =============================================================================
// Version 1 - attribution (shared_by, shared_at)
// =============================================================================

const MUSIC_TABLE_V1: Table = Table {
    name: "music",
    columns: &[
        sqlite_column!("rowid", SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", SqlType::Text, non_null = true),
        sqlite_column!("url", SqlType::Text, non_null = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!("shared_by", SqlType::Text),
        sqlite_column!("shared_at", SqlType::Integer),
    ],
    indices: &[("idx_music_created_at", "created_at")],
    unique_constraints: &[&["id"]],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute("ALTER TABLE music ADD COLUMN shared_by TEXT", [])?;
    conn.execute("ALTER TABLE music ADD COLUMN shared_at INTEGER", [])?;
    Ok(())
}

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[MUSIC_TABLE_V0],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[MUSIC_TABLE_V1],
        migration: Some(migrate_v0_to_v1),
    },
];

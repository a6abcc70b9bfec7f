//! Declarative table definitions, checked against the live database on open.
//!
//! A database created from schema `v` carries `PRAGMA user_version =
//! BASE_DB_VERSION + v`, which is how stores tell their own files apart from
//! arbitrary SQLite databases.

use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;

pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn parse(declared: &str) -> Option<SqlType> {
        match declared.to_ascii_uppercase().as_str() {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Text => write!(f, "TEXT"),
            SqlType::Integer => write!(f, "INTEGER"),
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

/// One row of `PRAGMA table_info`.
struct ColumnInfo {
    name: String,
    declared_type: String,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

/// SQLite reports expression defaults wrapped in parentheses.
fn unwrap_parens(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s)
}

impl Column {
    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default_value);
        }
        sql
    }

    /// Describes how `actual` differs from this definition, if it does.
    fn mismatch(&self, actual: &ColumnInfo) -> Option<String> {
        if actual.name != self.name {
            return Some(format!("expected column {}, found {}", self.name, actual.name));
        }
        if SqlType::parse(&actual.declared_type) != Some(self.sql_type) {
            return Some(format!(
                "column {} is {}, expected {}",
                self.name, actual.declared_type, self.sql_type
            ));
        }
        if actual.non_null != self.non_null {
            return Some(format!(
                "column {} non-null mismatch: expected {}",
                self.name, self.non_null
            ));
        }
        if actual.is_primary_key != self.is_primary_key {
            return Some(format!(
                "column {} primary key mismatch: expected {}",
                self.name, self.is_primary_key
            ));
        }
        if actual.default_value.as_deref().map(unwrap_parens) != self.default_value.map(unwrap_parens)
        {
            return Some(format!(
                "column {} default mismatch: expected {:?}, found {:?}",
                self.name, self.default_value, actual.default_value
            ));
        }
        None
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// `(index name, indexed column)`
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    fn create_statements(&self) -> Vec<String> {
        let mut definitions: Vec<String> = self.columns.iter().map(Column::definition).collect();
        definitions.extend(
            self.unique_constraints
                .iter()
                .map(|columns| format!("UNIQUE ({})", columns.join(", "))),
        );

        let mut statements = vec![format!(
            "CREATE TABLE {} ({})",
            self.name,
            definitions.join(", ")
        )];
        statements.extend(self.indices.iter().map(|(index_name, column)| {
            format!("CREATE INDEX {} ON {}({})", index_name, self.name, column)
        }));
        statements
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        for statement in self.create_statements() {
            conn.execute(&statement, [])?;
        }
        Ok(())
    }

    fn column_infos(&self, conn: &Connection) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", self.name))?;
        let infos = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? > 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(infos)
    }

    /// Fails with every difference between the live table and this definition.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let actual = self.column_infos(conn)?;
        let mut problems = vec![];

        if actual.len() != self.columns.len() {
            problems.push(format!(
                "has {} columns ({}), expected {} ({})",
                actual.len(),
                actual
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns.len(),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        } else {
            problems.extend(
                self.columns
                    .iter()
                    .zip(actual.iter())
                    .filter_map(|(expected, actual)| expected.mismatch(actual)),
            );
        }

        for (index_name, _) in self.indices {
            let found: Option<i32> = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2",
                    params![index_name, self.name],
                    |r| r.get(0),
                )
                .optional()?;
            if found.is_none() {
                problems.push(format!("missing index {}", index_name));
            }
        }

        if !problems.is_empty() {
            bail!("Table {}: {}", self.name, problems.join("; "));
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    /// Brings a database from the previous version to this one.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Every repository method is scoped to one owning user; rows of other
//!   users are invisible to reads and writes alike.
//! - Repositories refuse to operate on connections whose schema has not
//!   been migrated to the expected version.

use rusqlite::Connection;

pub mod completion_repo;
pub mod habit_repo;

/// Schema readiness failure shared by repository constructors.
#[derive(Debug)]
pub(crate) enum SchemaCheckError {
    Sqlite(rusqlite::Error),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for SchemaCheckError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Verifies the connection is migrated and carries the expected table shape.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> Result<(), SchemaCheckError> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(SchemaCheckError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(SchemaCheckError::MissingTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(SchemaCheckError::MissingColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

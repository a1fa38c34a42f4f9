//! Schema lifecycle for the `waitlist` table.
//!
//! The version lives in `PRAGMA user_version`. A fresh database gets the current
//! table directly; older ones are walked forward one step at a time inside a
//! single transaction. Every step checks the live table before altering it, so
//! running `migrate` again is a no-op.

use rusqlite::{Connection, OptionalExtension, Transaction};
use waitlist_core::{Result, WaitlistError};

pub const TABLE: &str = "waitlist";
pub const SCHEMA_VERSION: u32 = 2;

/// Current table definition.
const CREATE_WAITLIST: &str = "
    CREATE TABLE IF NOT EXISTS waitlist (
        _id INTEGER PRIMARY KEY AUTOINCREMENT,
        guest_name TEXT NOT NULL,
        party_size INTEGER NOT NULL,
        timestamp INTEGER NOT NULL DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)),
        mobile_number TEXT
    );
";

/// Bring the database to `SCHEMA_VERSION`. Returns how many steps were applied.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let tx = conn.transaction().map_err(unavailable)?;
    let mut version = user_version(&tx)?;

    if version > SCHEMA_VERSION {
        return Err(WaitlistError::StorageUnavailable(format!(
            "schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    if !table_exists(&tx)? {
        tx.execute_batch(CREATE_WAITLIST).map_err(unavailable)?;
        set_user_version(&tx, SCHEMA_VERSION)?;
        tx.commit().map_err(unavailable)?;
        tracing::info!("Created {TABLE} table at schema v{SCHEMA_VERSION}");
        return Ok(1);
    }

    // A table without a recorded version predates versioning.
    if version == 0 {
        version = 1;
    }

    let mut applied = 0;
    while version < SCHEMA_VERSION {
        match version {
            1 => {
                add_mobile_number(&tx)?;
                normalize_timestamps(&tx)?;
            }
            v => {
                return Err(WaitlistError::StorageUnavailable(format!(
                    "no migration from schema v{v}"
                )));
            }
        }
        version += 1;
        applied += 1;
        tracing::info!("Migrated {TABLE} to schema v{version}");
    }

    if user_version(&tx)? != version {
        set_user_version(&tx, version)?;
    }
    tx.commit().map_err(unavailable)?;
    Ok(applied)
}

/// v1 → v2: nullable `mobile_number`. Existing rows keep NULL.
fn add_mobile_number(tx: &Transaction<'_>) -> Result<()> {
    if has_column(tx, "mobile_number")? {
        return Ok(());
    }
    tx.execute_batch("ALTER TABLE waitlist ADD COLUMN mobile_number TEXT;")
        .map_err(unavailable)
}

/// v1 clients could leave `CURRENT_TIMESTAMP` text in the timestamp column.
/// SQLite sorts every TEXT value after every INTEGER, so rewrite those as epoch
/// millis; text that is not a date becomes 0.
fn normalize_timestamps(tx: &Transaction<'_>) -> Result<()> {
    let rewritten = tx
        .execute(
            "UPDATE waitlist
             SET timestamp = COALESCE(
                 CAST((julianday(timestamp) - 2440587.5) * 86400000 AS INTEGER), 0)
             WHERE typeof(timestamp) = 'text'",
            [],
        )
        .map_err(unavailable)?;
    let rounded = tx
        .execute(
            "UPDATE waitlist SET timestamp = CAST(timestamp AS INTEGER)
             WHERE typeof(timestamp) = 'real'",
            [],
        )
        .map_err(unavailable)?;
    if rewritten + rounded > 0 {
        tracing::info!("Rewrote {} legacy timestamps as epoch millis", rewritten + rounded);
    }
    Ok(())
}

pub fn user_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(unavailable)?;
    u32::try_from(version)
        .map_err(|_| WaitlistError::StorageUnavailable(format!("invalid schema version {version}")))
}

fn set_user_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(unavailable)
}

fn table_exists(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [TABLE],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(unavailable)
}

fn has_column(conn: &Connection, column: &str) -> Result<bool> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('waitlist')")
        .map_err(unavailable)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(unavailable)?;
    for name in names {
        if name.map_err(unavailable)? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn unavailable(e: rusqlite::Error) -> WaitlistError {
    WaitlistError::StorageUnavailable(format!("Migration: {e}"))
}

//! SQLite-backed waitlist store.
//! One table, one connection, synchronous calls.

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, Row, params};
use std::path::Path;
use std::time::Duration;
use waitlist_core::{GuestRecord, NewGuest, Result, WaitlistError};

use crate::schema;

/// Durable list of waiting parties.
pub struct WaitlistDb {
    conn: Connection,
}

impl WaitlistDb {
    /// Open or create the waitlist database and bring its schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WaitlistError::StorageUnavailable(format!("create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| WaitlistError::StorageUnavailable(format!("DB open: {e}")))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| WaitlistError::StorageUnavailable(format!("DB open: {e}")))?;
        let db = Self::init(conn)?;
        tracing::info!("Waitlist database ready at {}", path.display());
        Ok(db)
    }

    /// In-memory database, gone when dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| WaitlistError::StorageUnavailable(format!("DB open: {e}")))?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        schema::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> Result<u32> {
        schema::user_version(&self.conn)
    }

    /// Insert a guest and return the assigned id.
    pub fn add_guest(
        &self,
        name: &str,
        party_size: u32,
        mobile_number: Option<&str>,
        booked_at: i64,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO waitlist (guest_name, party_size, timestamp, mobile_number)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, party_size, booked_at, mobile_number],
            )
            .map_err(write_error)?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!("Added guest {id} ({name}, party of {party_size})");
        Ok(id)
    }

    /// Insert a validated guest booked now.
    pub fn add_guest_now(&self, guest: &NewGuest) -> Result<i64> {
        self.add_guest(
            &guest.name,
            guest.party_size,
            guest.mobile_number.as_deref(),
            Utc::now().timestamp_millis(),
        )
    }

    /// All waiting guests, first booked first.
    pub fn list_guests(&self) -> Result<Vec<GuestRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT _id, guest_name, party_size, mobile_number, timestamp
                 FROM waitlist ORDER BY timestamp ASC, _id ASC",
            )
            .map_err(db_error)?;
        let rows = stmt.query_map([], guest_from_row).map_err(db_error)?;
        let guests = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error)?;
        tracing::debug!("Listed {} guests", guests.len());
        Ok(guests)
    }

    /// Remove a guest. `false` when no such guest exists.
    pub fn remove_guest(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM waitlist WHERE _id = ?1", [id])
            .map_err(db_error)?;
        tracing::debug!("Remove guest {id}: {}", if removed > 0 { "removed" } else { "not found" });
        Ok(removed > 0)
    }

    pub fn guest_count(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM waitlist", [], |r| r.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(db_error)
    }
}

fn guest_from_row(row: &Row<'_>) -> rusqlite::Result<GuestRecord> {
    Ok(GuestRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        party_size: row.get(2)?,
        mobile_number: row.get(3)?,
        booked_at: booked_at_millis(row.get_ref(4)?),
    })
}

/// Epoch millis from the timestamp column. Rows written by older clients may
/// hold the SQLite `CURRENT_TIMESTAMP` text form instead of an integer.
fn booked_at_millis(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Integer(ms) => ms,
        ValueRef::Real(ms) => ms as i64,
        ValueRef::Text(text) => std::str::from_utf8(text)
            .ok()
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S").ok())
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or(0),
        ValueRef::Null | ValueRef::Blob(_) => 0,
    }
}

fn write_error(e: rusqlite::Error) -> WaitlistError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => WaitlistError::InvalidRecord(e.to_string()),
        _ => db_error(e),
    }
}

fn db_error(e: rusqlite::Error) -> WaitlistError {
    WaitlistError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> WaitlistDb {
        WaitlistDb::open_in_memory().unwrap()
    }

    #[test]
    fn test_open_and_migrate() {
        let dir = std::env::temp_dir().join(format!("waitlist-db-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("waitlist.db");
        let db = WaitlistDb::open(&path).unwrap();
        assert!(db.list_guests().unwrap().is_empty());
        assert_eq!(db.schema_version().unwrap(), schema::SCHEMA_VERSION);
        drop(db);

        // Reopen keeps data and schema.
        let db = WaitlistDb::open(&path).unwrap();
        db.add_guest("Ann", 2, None, 1).unwrap();
        drop(db);
        let db = WaitlistDb::open(&path).unwrap();
        assert_eq!(db.guest_count().unwrap(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_unwritable_location() {
        let dir = std::env::temp_dir().join(format!("waitlist-db-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        // A directory cannot be opened as a database file.
        let err = WaitlistDb::open(&dir).err().unwrap();
        assert!(matches!(err, WaitlistError::StorageUnavailable(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_add_then_list_round_trips_fields() {
        let db = db();
        let id = db.add_guest("Bob", 4, Some("+15551234567"), 1_000).unwrap();

        let guests = db.list_guests().unwrap();
        assert_eq!(
            guests,
            vec![GuestRecord {
                id,
                name: "Bob".into(),
                party_size: 4,
                mobile_number: Some("+15551234567".into()),
                booked_at: 1_000,
            }]
        );
    }

    #[test]
    fn test_fields_stored_exactly_as_given() {
        let db = db();
        db.add_guest("Cy", 0, Some(" +15551234567 "), 5).unwrap();
        db.add_guest("Di", 3, Some(""), 6).unwrap();
        db.add_guest("Ed", 1, None, 7).unwrap();

        let guests = db.list_guests().unwrap();
        assert_eq!(guests[0].party_size, 0);
        assert_eq!(guests[0].mobile_number.as_deref(), Some(" +15551234567 "));
        assert_eq!(guests[1].mobile_number.as_deref(), Some(""));
        assert_eq!(guests[2].mobile_number, None);
    }

    #[test]
    fn test_out_of_range_party_size_is_an_error() {
        let db = db();
        db.conn
            .execute(
                "INSERT INTO waitlist (guest_name, party_size, timestamp) VALUES ('Neg', -2, 0)",
                [],
            )
            .unwrap();
        assert!(matches!(db.list_guests(), Err(WaitlistError::Database(_))));
    }

    #[test]
    fn test_list_ordered_by_booked_at() {
        let db = db();
        let a = db.add_guest("A", 1, None, 0).unwrap();
        let b = db.add_guest("B", 1, None, 1_000).unwrap();
        let c = db.add_guest("C", 1, None, 500).unwrap();

        let guests = db.list_guests().unwrap();
        let ids: Vec<i64> = guests.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![a, c, b]);
        let stamps: Vec<i64> = guests.iter().map(|g| g.booked_at).collect();
        assert_eq!(stamps, vec![0, 500, 1_000]);
    }

    #[test]
    fn test_equal_timestamps_keep_insert_order() {
        let db = db();
        let first = db.add_guest("First", 1, None, 42).unwrap();
        let second = db.add_guest("Second", 1, None, 42).unwrap();
        let ids: Vec<i64> = db.list_guests().unwrap().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_list_is_non_decreasing_for_scrambled_inserts() {
        let db = db();
        for stamp in [9, 3, 7, 3, 0, 12, 5, 1, 8, 8] {
            db.add_guest("g", 1, None, stamp).unwrap();
        }
        let guests = db.list_guests().unwrap();
        assert_eq!(guests.len(), 10);
        assert!(guests.windows(2).all(|w| w[0].booked_at <= w[1].booked_at));
    }

    #[test]
    fn test_remove_guest() {
        let db = db();
        let keep = db.add_guest("Keep", 2, None, 1).unwrap();
        let gone = db.add_guest("Gone", 3, None, 2).unwrap();

        assert!(db.remove_guest(gone).unwrap());
        let guests = db.list_guests().unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].id, keep);

        assert!(!db.remove_guest(gone).unwrap());
        assert_eq!(db.guest_count().unwrap(), 1);
        assert!(!db.remove_guest(9_999).unwrap());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let db = db();
        let first = db.add_guest("One", 1, None, 1).unwrap();
        assert!(db.remove_guest(first).unwrap());
        let next = db.add_guest("Two", 1, None, 2).unwrap();
        assert!(next > first);
    }

    #[test]
    fn test_add_guest_now_stamps_current_time() {
        let db = db();
        let before = Utc::now().timestamp_millis();
        let guest = NewGuest::from_form("Dee", "2", "").unwrap();
        db.add_guest_now(&guest).unwrap();
        let after = Utc::now().timestamp_millis();

        let stored = &db.list_guests().unwrap()[0];
        assert!(stored.booked_at >= before && stored.booked_at <= after);
        assert_eq!(stored.party_size, 2);
    }

    #[test]
    fn test_not_null_violation_is_invalid_record() {
        let db = db();
        let err = db
            .conn
            .execute(
                "INSERT INTO waitlist (guest_name, party_size, timestamp) VALUES (NULL, 1, 0)",
                [],
            )
            .map_err(write_error)
            .unwrap_err();
        assert!(matches!(err, WaitlistError::InvalidRecord(_)));
        assert_eq!(db.guest_count().unwrap(), 0);
    }

    #[test]
    fn test_migrated_v1_rows_listed() {
        let conn = crate::schema::tests::v1_connection(3);
        let db = WaitlistDb::init(conn).unwrap();
        let guests = db.list_guests().unwrap();
        assert_eq!(guests.len(), 3);
        assert!(guests.iter().all(|g| g.mobile_number.is_none()));
        assert_eq!(guests[2].booked_at, 2_000);

        let id = db.add_guest("New", 2, Some("+15550000000"), 3_000).unwrap();
        assert_eq!(db.list_guests().unwrap()[3].id, id);
    }

    #[test]
    fn test_legacy_text_timestamp_sorts_by_time() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE waitlist (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                guest_name TEXT NOT NULL,
                party_size INTEGER NOT NULL,
                timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            PRAGMA user_version = 1;
            INSERT INTO waitlist (guest_name, party_size, timestamp)
                VALUES ('Old', 2, '2020-01-01 00:00:00');",
        )
        .unwrap();
        let db = WaitlistDb::init(conn).unwrap();
        db.add_guest("New", 2, None, Utc::now().timestamp_millis()).unwrap();
        db.add_guest("Early", 2, None, 1_000).unwrap();

        let guests = db.list_guests().unwrap();
        let names: Vec<&str> = guests.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Old", "New"]);
        assert_eq!(guests[1].booked_at, 1_577_836_800_000);
        assert!(guests.windows(2).all(|w| w[0].booked_at <= w[1].booked_at));
    }

    #[test]
    fn test_text_timestamp_from_old_rows() {
        assert_eq!(
            booked_at_millis(ValueRef::Text(b"1970-01-01 00:00:01")),
            1_000
        );
        assert_eq!(booked_at_millis(ValueRef::Text(b"garbage")), 0);
        assert_eq!(booked_at_millis(ValueRef::Integer(77)), 77);
    }
}

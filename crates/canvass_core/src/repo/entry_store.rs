//! Entry store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/upsert/merge/delete over the `entries` table.
//! - Own the addressing scheme: every record is keyed by its normalized
//!   address, assigned on first write and reused afterwards.
//!
//! # Invariants
//! - Notes are embedded as one JSON column and written whole.
//! - Listing follows insertion order; `created_at` only has second
//!   resolution, so ties fall back to the row's insertion id.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::entry::{
    Coordinates, Entry, EntryId, EntryPatch, EntryValidationError, Note, VisitStatus,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    address,
    lat,
    lng,
    status,
    homeowner_name,
    phone_number,
    email,
    notes,
    created_at
FROM entries";

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store failure surfaced to the tracker.
#[derive(Debug)]
pub enum StoreError {
    Validation(EntryValidationError),
    Db(DbError),
    NotFound(EntryId),
    InvalidData(String),
    /// Transport, permission or runtime failure of a remote backend.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::Backend(message) => write!(f, "record store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::Backend(_) => None,
        }
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Document-store contract for entry persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All entries in first-persisted order.
    async fn list_entries(&self) -> StoreResult<Vec<Entry>>;
    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<Entry>>;
    /// Create-or-update. `None` stores under the normalized address and
    /// returns that key.
    async fn upsert_entry(&self, id: Option<&EntryId>, entry: &Entry) -> StoreResult<EntryId>;
    /// Partial update; absent patch fields keep their stored values.
    async fn merge_entry(&self, id: &EntryId, patch: &EntryPatch) -> StoreResult<()>;
    /// Removes the entry; succeeds when it is already gone.
    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()>;
}

/// SQLite-backed record store.
///
/// The connection is synchronous, so every call hops onto the blocking pool.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Wraps a bootstrapped connection (see `db::open_db`).
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_entries_table(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))?;
            op(&*guard)
        })
        .await
        .map_err(|err| StoreError::Backend(format!("store task failed: {err}")))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        self.with_conn(list_entries_sync).await
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<Entry>> {
        let id = id.clone();
        self.with_conn(move |conn| get_entry_sync(conn, &id)).await
    }

    async fn upsert_entry(&self, id: Option<&EntryId>, entry: &Entry) -> StoreResult<EntryId> {
        entry.validate()?;
        let key = id
            .cloned()
            .unwrap_or_else(|| EntryId::for_address(&entry.address));
        let entry = entry.clone();
        self.with_conn(move |conn| upsert_entry_sync(conn, key, &entry))
            .await
    }

    async fn merge_entry(&self, id: &EntryId, patch: &EntryPatch) -> StoreResult<()> {
        patch.validate()?;
        let id = id.clone();
        let patch = patch.clone();
        self.with_conn(move |conn| merge_entry_sync(conn, &id, &patch))
            .await
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM entries WHERE id = ?1;", [id.as_str()])?;
            Ok(())
        })
        .await
    }
}

fn list_entries_sync(conn: &Connection) -> StoreResult<Vec<Entry>> {
    let mut stmt =
        conn.prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

fn get_entry_sync(conn: &Connection, id: &EntryId) -> StoreResult<Option<Entry>> {
    let mut stmt = conn.prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.as_str()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_entry_row(row)?)),
        None => Ok(None),
    }
}

fn upsert_entry_sync(conn: &Connection, key: EntryId, entry: &Entry) -> StoreResult<EntryId> {
    conn.execute(
        "INSERT INTO entries (
            id,
            address,
            lat,
            lng,
            status,
            homeowner_name,
            phone_number,
            email,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            homeowner_name = excluded.homeowner_name,
            phone_number = excluded.phone_number,
            email = excluded.email,
            notes = excluded.notes,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            key.as_str(),
            entry.address.as_str(),
            entry.location.lat,
            entry.location.lng,
            entry.status.code(),
            entry.homeowner_name.as_str(),
            entry.phone_number.as_str(),
            entry.email.as_str(),
            notes_to_db(&entry.notes)?,
        ],
    )?;
    Ok(key)
}

fn merge_entry_sync(conn: &Connection, id: &EntryId, patch: &EntryPatch) -> StoreResult<()> {
    let notes = patch.notes.as_deref().map(notes_to_db).transpose()?;
    let changed = conn.execute(
        "UPDATE entries
         SET
            status = COALESCE(?2, status),
            homeowner_name = COALESCE(?3, homeowner_name),
            phone_number = COALESCE(?4, phone_number),
            email = COALESCE(?5, email),
            notes = COALESCE(?6, notes),
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![
            id.as_str(),
            patch.status.map(VisitStatus::code),
            patch.homeowner_name.as_deref(),
            patch.phone_number.as_deref(),
            patch.email.as_deref(),
            notes,
        ],
    )?;

    if changed == 0 {
        return Err(StoreError::NotFound(id.clone()));
    }
    Ok(())
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<Entry> {
    let id: String = row.get("id")?;

    let status_text: String = row.get("status")?;
    let status = VisitStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid status `{status_text}` in entries.status for `{id}`"
        ))
    })?;

    let notes_text: String = row.get("notes")?;
    let notes: Vec<Note> = serde_json::from_str(&notes_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid notes json in entries.notes for `{id}`: {err}"))
    })?;

    let entry = Entry {
        id: Some(EntryId::new(id)),
        address: row.get("address")?,
        location: Coordinates::new(row.get("lat")?, row.get("lng")?),
        status,
        homeowner_name: row.get("homeowner_name")?,
        phone_number: row.get("phone_number")?,
        email: row.get("email")?,
        notes,
        created_at: row.get("created_at")?,
    };
    entry.validate()?;
    Ok(entry)
}

fn notes_to_db(notes: &[Note]) -> StoreResult<String> {
    serde_json::to_string(notes)
        .map_err(|err| StoreError::InvalidData(format!("notes are not serializable: {err}")))
}

fn ensure_entries_table(conn: &Connection) -> StoreResult<()> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'entries';",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    if found.is_none() {
        return Err(StoreError::InvalidData(
            "missing required table `entries`; open the connection via db::open_db".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::notes_to_db;
    use crate::model::entry::Note;

    #[test]
    fn notes_serialize_as_json_array() {
        let notes = vec![Note {
            text: "left flyer".to_string(),
            timestamp: "2024-05-01 09:30:00".to_string(),
        }];
        let json = notes_to_db(&notes).unwrap();
        assert_eq!(
            json,
            r#"[{"text":"left flyer","timestamp":"2024-05-01 09:30:00"}]"#
        );
    }
}

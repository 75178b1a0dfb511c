//! Core Store implementation

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::record::{Filter, FilterOp, IndexValue, Record};
use crate::now_ms;

const DB_FILE: &str = "hubstore.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS idx_records_seq ON records(collection, seq);
CREATE TABLE IF NOT EXISTS indexes (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    field TEXT NOT NULL,
    str_value TEXT,
    int_value INTEGER
);
CREATE INDEX IF NOT EXISTS idx_indexes_lookup ON indexes(collection, field, str_value, int_value);
CREATE INDEX IF NOT EXISTS idx_indexes_record ON indexes(collection, id);
"#;

/// One line of a collection's JSONL log
#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    op: LogOp,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    record: Option<serde_json::Value>,
    at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LogOp {
    Put,
    Delete,
}

/// Persistent record store backed by JSONL logs and a SQLite cache
pub struct Store {
    base_path: PathBuf,
    conn: Connection,
    next_seq: i64,
}

impl Store {
    /// Open or create a store at the given directory and replay its logs
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        debug!(?base_path, "Store::open: called");
        fs::create_dir_all(&base_path)?;

        let conn = Connection::open(base_path.join(DB_FILE))?;
        conn.execute_batch(SCHEMA)?;

        let mut store = Self {
            base_path,
            conn,
            next_seq: 1,
        };
        store.sync()?;
        Ok(store)
    }

    /// Directory holding the logs and database
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Rebuild the SQLite cache from the JSONL logs
    ///
    /// Index rows are cleared; call `rebuild_indexes` for every record type
    /// afterwards so filtered listing works.
    pub fn sync(&mut self) -> StoreResult<()> {
        debug!(base_path = ?self.base_path, "Store::sync: called");
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        tx.execute("DELETE FROM indexes", [])?;

        let mut seq = 1i64;
        let mut replayed = 0usize;
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e != "jsonl").unwrap_or(true) {
                continue;
            }
            let Some(collection) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let reader = BufReader::new(fs::File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: LogEntry = match serde_json::from_str(&line) {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(%collection, line = line_no + 1, error = %e, "Skipping malformed log line");
                        continue;
                    }
                };
                match (entry.op, entry.record) {
                    (LogOp::Put, Some(record)) => {
                        tx.execute(
                            "INSERT INTO records (collection, id, seq, updated_at, data) VALUES (?1, ?2, ?3, ?4, ?5)
                             ON CONFLICT(collection, id) DO UPDATE SET updated_at = excluded.updated_at, data = excluded.data",
                            params![collection, entry.id, seq, entry.at, record.to_string()],
                        )?;
                        seq += 1;
                    }
                    (LogOp::Put, None) => {
                        warn!(%collection, id = %entry.id, "Skipping put without record");
                    }
                    (LogOp::Delete, _) => {
                        tx.execute(
                            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                            params![collection, entry.id],
                        )?;
                    }
                }
                replayed += 1;
            }
        }
        tx.commit()?;

        self.next_seq = seq;
        info!(replayed, "Store synced from JSONL logs");
        Ok(())
    }

    /// Recompute index rows for every record of type `T`
    pub fn rebuild_indexes<T: Record>(&mut self) -> StoreResult<usize> {
        let collection = T::collection_name();
        debug!(%collection, "Store::rebuild_indexes: called");
        let records: Vec<T> = self.list(&[])?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM indexes WHERE collection = ?1", params![collection])?;
        for record in &records {
            write_indexes(&tx, record)?;
        }
        tx.commit()?;

        Ok(records.len())
    }

    /// Create a new record, failing if the id is taken
    pub fn create<T: Record>(&mut self, record: T) -> StoreResult<String> {
        debug!(collection = T::collection_name(), id = %record.id(), "Store::create: called");
        let mut ids = self.create_many(vec![record])?;
        Ok(ids.remove(0))
    }

    /// Create several records in one log append and one transaction
    ///
    /// Nothing is written if any id already exists or repeats in the batch.
    pub fn create_many<T: Record>(&mut self, records: Vec<T>) -> StoreResult<Vec<String>> {
        let collection = T::collection_name();
        debug!(%collection, count = records.len(), "Store::create_many: called");

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id().to_string()) || self.exists::<T>(record.id())? {
                return Err(StoreError::AlreadyExists {
                    collection: collection.to_string(),
                    id: record.id().to_string(),
                });
            }
        }

        self.put_all(&records)?;
        Ok(records.iter().map(|r| r.id().to_string()).collect())
    }

    /// Insert or replace a record
    pub fn update<T: Record>(&mut self, record: T) -> StoreResult<()> {
        debug!(collection = T::collection_name(), id = %record.id(), "Store::update: called");
        self.put_all(std::slice::from_ref(&record))
    }

    /// Fetch a record by id
    pub fn get<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        debug!(collection = T::collection_name(), %id, "Store::get: called");
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 AND id = ?2",
                params![T::collection_name(), id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete a record by id
    pub fn delete<T: Record>(&mut self, id: &str) -> StoreResult<()> {
        let collection = T::collection_name();
        debug!(%collection, %id, "Store::delete: called");
        if !self.exists::<T>(id)? {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        self.append_log(
            collection,
            &[LogEntry {
                op: LogOp::Delete,
                id: id.to_string(),
                record: None,
                at: now_ms(),
            }],
        )?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        tx.execute(
            "DELETE FROM indexes WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// List records matching every filter, in insertion order
    ///
    /// A record without an index row for a filtered field never matches.
    pub fn list<T: Record>(&self, filters: &[Filter]) -> StoreResult<Vec<T>> {
        debug!(collection = T::collection_name(), filter_count = filters.len(), "Store::list: called");
        let mut sql = String::from("SELECT r.data FROM records r WHERE r.collection = ?");
        let mut values = vec![SqlValue::Text(T::collection_name().to_string())];

        for filter in filters {
            let (column, value) = filter_binding(filter)?;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM indexes i WHERE i.collection = r.collection AND i.id = r.id \
                 AND i.field = ? AND i.{} {} ?)",
                column,
                filter.op.sql()
            ));
            values.push(SqlValue::Text(filter.field.clone()));
            values.push(value);
        }
        sql.push_str(" ORDER BY r.seq");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }

    /// Number of records of type `T`
    pub fn count<T: Record>(&self) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![T::collection_name()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn exists<T: Record>(&self, id: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND id = ?2",
                params![T::collection_name(), id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn put_all<T: Record>(&mut self, records: &[T]) -> StoreResult<()> {
        let collection = T::collection_name();
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(LogEntry {
                op: LogOp::Put,
                id: record.id().to_string(),
                record: Some(serde_json::to_value(record)?),
                at: record.updated_at(),
            });
        }
        self.append_log(collection, &entries)?;

        let tx = self.conn.transaction()?;
        for (record, entry) in records.iter().zip(&entries) {
            let data = entry.record.as_ref().map(|v| v.to_string()).unwrap_or_default();
            tx.execute(
                "INSERT INTO records (collection, id, seq, updated_at, data) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(collection, id) DO UPDATE SET updated_at = excluded.updated_at, data = excluded.data",
                params![collection, record.id(), self.next_seq, record.updated_at(), data],
            )?;
            self.next_seq += 1;
            tx.execute(
                "DELETE FROM indexes WHERE collection = ?1 AND id = ?2",
                params![collection, record.id()],
            )?;
            write_indexes(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn append_log(&self, collection: &str, entries: &[LogEntry]) -> StoreResult<()> {
        let path = self.base_path.join(format!("{}.jsonl", collection));
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        fs2::FileExt::lock_exclusive(&file)?;

        let mut buf = String::new();
        for entry in entries {
            buf.push_str(&serde_json::to_string(entry)?);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        debug!(?path, count = entries.len(), "append_log: wrote entries");
        Ok(())
    }
}

fn write_indexes<T: Record>(tx: &rusqlite::Transaction<'_>, record: &T) -> StoreResult<()> {
    for (field, value) in record.indexed_fields() {
        let (str_value, int_value): (Option<String>, Option<i64>) = match value {
            IndexValue::String(s) => (Some(s), None),
            IndexValue::Int(i) => (None, Some(i)),
            IndexValue::Bool(b) => (None, Some(b as i64)),
        };
        tx.execute(
            "INSERT INTO indexes (collection, id, field, str_value, int_value) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![T::collection_name(), record.id(), field, str_value, int_value],
        )?;
    }
    Ok(())
}

fn filter_binding(filter: &Filter) -> StoreResult<(&'static str, SqlValue)> {
    match (&filter.value, filter.op) {
        (IndexValue::String(s), FilterOp::Contains) => Ok(("str_value", SqlValue::Text(format!("%{}%", s)))),
        (IndexValue::String(s), _) => Ok(("str_value", SqlValue::Text(s.clone()))),
        (_, FilterOp::Contains) => Err(StoreError::InvalidFilter {
            field: filter.field.clone(),
            reason: "contains requires a string value".to_string(),
        }),
        (IndexValue::Int(i), _) => Ok(("int_value", SqlValue::Integer(*i))),
        (IndexValue::Bool(b), _) => Ok(("int_value", SqlValue::Integer(*b as i64))),
    }
}

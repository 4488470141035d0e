//! Embedded key-value persistence.
//!
//! Each entity kind lives in its own SQLite file holding a single
//! `records(key, value)` table. Values are bincode-encoded records. Imports
//! only ever insert when a key is absent, so re-running an import never
//! overwrites what an earlier run stored.

use std::{
    fmt,
    fs,
    path::Path,
};

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};

use crate::model::{Deal, Lead, Task, User, Users};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
)";

pub fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .context("Encoding record")
}

pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .context("Decoding record")?;
    Ok(value)
}

pub struct KvStore {
    conn: Connection,
    name: String,
}

impl fmt::Debug for KvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore").field("name", &self.name).finish()
    }
}

impl KvStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating store directory {parent:?}"))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("Opening store {path:?}"))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::init(conn, name)
    }

    pub fn open_in_memory(name: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory store")?;
        Self::init(conn, name.to_string())
    }

    fn init(conn: Connection, name: String) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .with_context(|| format!("Initialising store '{name}'"))?;
        Ok(KvStore { conn, name })
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Reading '{key}' from store '{}'", self.name))
    }

    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO records (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Writing '{key}' to store '{}'", self.name))?;
        Ok(())
    }

    /// Stores `value` only when `key` is absent. Returns whether a row was written.
    pub fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO records (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .with_context(|| format!("Writing '{key}' to store '{}'", self.name))?;
        Ok(changed == 1)
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM records WHERE key = ?1", params![key])
            .with_context(|| format!("Deleting '{key}' from store '{}'", self.name))?;
        Ok(changed == 1)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM records ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Listing keys of store '{}'", self.name))?;
        Ok(keys)
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .with_context(|| format!("Counting records of store '{}'", self.name))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => decode_value(&bytes)
                .with_context(|| format!("Decoding '{key}' from store '{}'", self.name))
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn insert_record_if_absent<T: Serialize>(&self, key: &str, record: &T) -> Result<bool> {
        let bytes = encode_value(record)?;
        self.insert_if_absent(key, &bytes)
    }

    /// Every stored record, ordered by key.
    pub fn records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM records ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Scanning store '{}'", self.name))?;
        rows.iter()
            .map(|(key, bytes)| {
                decode_value(bytes)
                    .with_context(|| format!("Decoding '{key}' from store '{}'", self.name))
            })
            .collect()
    }

    pub fn close(self) -> Result<()> {
        let name = self.name;
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .with_context(|| format!("Closing store '{name}'"))
    }
}

/// Outcome of writing one batch into a store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl InsertSummary {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// The four per-kind stores of one import root.
#[derive(Debug)]
pub struct DataLake {
    pub leads: KvStore,
    pub deals: KvStore,
    pub tasks: KvStore,
    pub users: KvStore,
}

impl DataLake {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).with_context(|| format!("Creating lake root {root:?}"))?;
        let open = |name: &str| KvStore::open(&root.join(format!("{name}.sqlite")));
        let lake = DataLake {
            leads: open("leads")?,
            deals: open("deals")?,
            tasks: open("tasks")?,
            users: open("users")?,
        };
        debug!("Opened lake at {root:?}");
        Ok(lake)
    }

    /// Opens a lake an earlier import created. A missing root is an error.
    pub fn open_existing(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            bail!("No lake found at {root:?}; run `import` first");
        }
        Self::open(root)
    }

    /// Inserts every record whose key is absent. Records without a key are
    /// skipped and counted as such.
    fn insert_keyed<T, F>(store: &KvStore, records: &[T], key_of: F) -> Result<InsertSummary>
    where
        T: Serialize,
        F: Fn(&T) -> &str,
    {
        let mut summary = InsertSummary::default();
        let mut keyless = 0usize;
        for record in records {
            let key = key_of(record);
            if key.is_empty() {
                keyless += 1;
                summary.record(false);
                continue;
            }
            summary.record(store.insert_record_if_absent(key, record)?);
        }
        if keyless > 0 {
            warn!("Skipped {keyless} record(s) without an id in store '{}'", store.name);
        }
        Ok(summary)
    }

    pub fn insert_deals(&self, deals: &[Deal]) -> Result<InsertSummary> {
        Self::insert_keyed(&self.deals, deals, |d| d.contact.id.as_str())
    }

    pub fn insert_leads(&self, leads: &[Lead]) -> Result<InsertSummary> {
        Self::insert_keyed(&self.leads, leads, |l| l.contact.id.as_str())
    }

    pub fn insert_tasks(&self, tasks: &[Task]) -> Result<InsertSummary> {
        Self::insert_keyed(&self.tasks, tasks, |t| t.id.as_str())
    }

    pub fn insert_users(&self, users: &[User]) -> Result<InsertSummary> {
        Self::insert_keyed(&self.users, users, |u| u.id.as_str())
    }

    pub fn get_deal_by_id(&self, id: &str) -> Result<Option<Deal>> {
        self.deals.get_record(id)
    }

    pub fn get_lead_by_id(&self, id: &str) -> Result<Option<Lead>> {
        self.leads.get_record(id)
    }

    pub fn get_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        self.tasks.get_record(id)
    }

    pub fn all_deals(&self) -> Result<Vec<Deal>> {
        self.deals.records()
    }

    pub fn all_leads(&self) -> Result<Vec<Lead>> {
        self.leads.records()
    }

    pub fn list_users(&self) -> Result<Users> {
        Ok(Users {
            users: self.users.records()?,
        })
    }

    pub fn close(self) -> Result<()> {
        self.leads.close()?;
        self.deals.close()?;
        self.tasks.close()?;
        self.users.close()
    }
}

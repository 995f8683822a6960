//! LocalCloud — redb-backed persistence for the emulated control plane.
//!
//! Provides typed JSON CRUD over the tables in [`crate::tables`]. The
//! provider trait implementations in [`crate::cloud`] are built on these
//! primitives. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distributions::Alphanumeric;
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use sfj_core::{ApiRecord, PermissionGrant};

use crate::error::{LocalError, LocalResult};
use crate::tables::*;

/// Convert any `Display` error into a `LocalError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| LocalError::$variant(e.to_string())
    };
}

/// Thread-safe emulated control plane for one account/region pair.
#[derive(Clone)]
pub struct LocalCloud {
    db: Arc<Database>,
    region: String,
    account_id: String,
}

impl LocalCloud {
    /// Open (or create) a persistent control plane at the given path.
    pub fn open(path: &Path, region: &str, account_id: &str) -> LocalResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let cloud = Self::with_db(db, region, account_id);
        cloud.ensure_tables()?;
        debug!(?path, region, "local control plane opened");
        Ok(cloud)
    }

    /// Create an ephemeral in-memory control plane (for testing).
    pub fn open_in_memory(region: &str, account_id: &str) -> LocalResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let cloud = Self::with_db(db, region, account_id);
        cloud.ensure_tables()?;
        debug!(region, "in-memory control plane opened");
        Ok(cloud)
    }

    fn with_db(db: Database, region: &str, account_id: &str) -> Self {
        Self {
            db: Arc::new(db),
            region: region.to_string(),
            account_id: account_id.to_string(),
        }
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> LocalResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        for table in [FUNCTIONS, APIS, INTEGRATIONS, ROUTES, STAGES, PERMISSIONS] {
            // Opening a table in a write transaction creates it if absent.
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    // ── Generic record access ──────────────────────────────────────

    /// Get one record by key.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        key: &str,
    ) -> LocalResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all records whose key starts with `prefix` (empty = all).
    pub(crate) fn scan_records<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        prefix: &str,
    ) -> LocalResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                let record = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Insert a record only if the key is free. Returns false if it was taken.
    pub(crate) fn insert_new<T: Serialize>(
        &self,
        table: JsonTable,
        key: &str,
        record: &T,
    ) -> LocalResult<bool> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            if table.get(key).map_err(map_err!(Read))?.is_some() {
                return Ok(false);
            }
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "record inserted");
        Ok(true)
    }

    /// Apply `update` to an existing record atomically. Returns the new
    /// record, or `None` if the key was absent.
    pub(crate) fn update_record<T, F>(
        &self,
        table: JsonTable,
        key: &str,
        update: F,
    ) -> LocalResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            let current: Option<T> = match table.get(key).map_err(map_err!(Read))? {
                Some(guard) => {
                    Some(serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?)
                }
                None => None,
            };
            let Some(mut record) = current else {
                return Ok(None);
            };
            update(&mut record);
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
            updated = record;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(Some(updated))
    }

    // ── Inspection ─────────────────────────────────────────────────

    /// All gateways created in this control plane.
    pub fn list_apis(&self) -> LocalResult<Vec<ApiRecord>> {
        self.scan_records(APIS, "")
    }

    /// Permission statements attached to a function.
    pub fn list_permissions(&self, function_name: &str) -> LocalResult<Vec<PermissionGrant>> {
        self.scan_records(PERMISSIONS, &child_prefix(function_name))
    }
}

/// Provider-style resource id: 10 lowercase alphanumerics.
pub(crate) fn new_resource_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        body: String,
        version: u32,
    }

    fn note(body: &str) -> Note {
        Note {
            body: body.to_string(),
            version: 1,
        }
    }

    fn test_cloud() -> LocalCloud {
        LocalCloud::open_in_memory("us-east-2", "123456789012").unwrap()
    }

    #[test]
    fn insert_new_and_get() {
        let cloud = test_cloud();
        assert!(cloud.insert_new(APIS, "a", &note("first")).unwrap());
        let got: Option<Note> = cloud.get_record(APIS, "a").unwrap();
        assert_eq!(got, Some(note("first")));
    }

    #[test]
    fn insert_new_refuses_taken_key() {
        let cloud = test_cloud();
        assert!(cloud.insert_new(APIS, "a", &note("first")).unwrap());
        assert!(!cloud.insert_new(APIS, "a", &note("second")).unwrap());
        let got: Note = cloud.get_record(APIS, "a").unwrap().unwrap();
        assert_eq!(got.body, "first");
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let cloud = test_cloud();
        let got: Option<Note> = cloud.get_record(FUNCTIONS, "missing").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn scan_filters_by_prefix() {
        let cloud = test_cloud();
        cloud.insert_new(ROUTES, "api1/ANY /a", &note("a")).unwrap();
        cloud.insert_new(ROUTES, "api1/ANY /b", &note("b")).unwrap();
        cloud.insert_new(ROUTES, "api2/ANY /a", &note("c")).unwrap();

        let api1: Vec<Note> = cloud.scan_records(ROUTES, &child_prefix("api1")).unwrap();
        assert_eq!(api1.len(), 2);
        let all: Vec<Note> = cloud.scan_records(ROUTES, "").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn update_in_place() {
        let cloud = test_cloud();
        cloud.insert_new(FUNCTIONS, "f", &note("v1")).unwrap();

        let updated = cloud
            .update_record(FUNCTIONS, "f", |n: &mut Note| n.version += 1)
            .unwrap();
        assert_eq!(updated.map(|n| n.version), Some(2));

        let missing = cloud
            .update_record(FUNCTIONS, "nope", |n: &mut Note| n.version += 1)
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.redb");
        {
            let cloud = LocalCloud::open(&path, "us-east-2", "123456789012").unwrap();
            cloud.insert_new(APIS, "abc", &note("kept")).unwrap();
        }
        let cloud = LocalCloud::open(&path, "us-east-2", "123456789012").unwrap();
        let got: Option<Note> = cloud.get_record(APIS, "abc").unwrap();
        assert_eq!(got, Some(note("kept")));
    }

    #[test]
    fn resource_ids_look_like_provider_ids() {
        let id = new_resource_id();
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}

use crate::domain::organizer::OrganizerAccount;
use crate::domain::ports::{OrganizerStore, OutboxStore};
use crate::domain::provisioning::OutboxEntry;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for organizer records.
pub const CF_ORGANIZERS: &str = "organizers";
/// Column Family for provisioning outbox entries.
pub const CF_OUTBOX: &str = "provisioning_outbox";

const ORGANIZER_KEY_PREFIX: &str = "organizer:";

/// A persistent store implementation using RocksDB.
///
/// Organizer records and outbox entries live in separate Column Families, both
/// JSON-encoded. Organizer keys are `organizer:{user_id}` so prefix scans map to
/// a forward iteration from the prefix.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_organizers = ColumnFamilyDescriptor::new(CF_ORGANIZERS, Options::default());
        let cf_outbox = ColumnFamilyDescriptor::new(CF_OUTBOX, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_organizers, cf_outbox])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str, prefix: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let iter = self.db.iterator_cf(
            cf,
            IteratorMode::From(prefix.as_bytes(), Direction::Forward),
        );

        let mut values = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PayoutError::Storage(format!("{} column family not found", name)))
    }
}

fn organizer_key(user_id: &str) -> String {
    format!("{}{}", ORGANIZER_KEY_PREFIX, user_id)
}

#[async_trait]
impl OrganizerStore for RocksDBStore {
    async fn get(&self, user_id: &str) -> Result<Option<OrganizerAccount>> {
        self.get_json(CF_ORGANIZERS, &organizer_key(user_id))
    }

    async fn upsert(&self, record: OrganizerAccount) -> Result<()> {
        self.put_json(CF_ORGANIZERS, &organizer_key(&record.user_id), &record)
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<OrganizerAccount>> {
        self.scan_json(CF_ORGANIZERS, &organizer_key(prefix))
    }
}

#[async_trait]
impl OutboxStore for RocksDBStore {
    async fn get(&self, key: &str) -> Result<Option<OutboxEntry>> {
        self.get_json(CF_OUTBOX, key)
    }

    async fn put(&self, entry: OutboxEntry) -> Result<()> {
        self.put_json(CF_OUTBOX, &entry.key, &entry)
    }

    async fn entries_for(&self, user_id: &str) -> Result<Vec<OutboxEntry>> {
        let entries: Vec<OutboxEntry> = self.scan_json(CF_OUTBOX, &format!("{}:", user_id))?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.request.user_id == user_id)
            .collect())
    }
}

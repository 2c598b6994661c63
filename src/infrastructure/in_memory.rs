use crate::domain::organizer::OrganizerAccount;
use crate::domain::ports::{OrganizerStore, OutboxStore};
use crate::domain::provisioning::OutboxEntry;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for organizer records.
///
/// Uses `Arc<RwLock<BTreeMap<String, OrganizerAccount>>>` so clones share state and
/// prefix scans come back ordered by `user_id`.
#[derive(Default, Clone)]
pub struct InMemoryOrganizerStore {
    records: Arc<RwLock<BTreeMap<String, OrganizerAccount>>>,
}

impl InMemoryOrganizerStore {
    /// Creates a new, empty in-memory organizer store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizerStore for InMemoryOrganizerStore {
    async fn get(&self, user_id: &str) -> Result<Option<OrganizerAccount>> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }

    async fn upsert(&self, record: OrganizerAccount) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<OrganizerAccount>> {
        let records = self.records.read().await;
        Ok(records
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

/// A thread-safe in-memory store for provisioning outbox entries.
#[derive(Default, Clone)]
pub struct InMemoryOutboxStore {
    entries: Arc<RwLock<BTreeMap<String, OutboxEntry>>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn get(&self, key: &str) -> Result<Option<OutboxEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, entry: OutboxEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn entries_for(&self, user_id: &str) -> Result<Vec<OutboxEntry>> {
        let entries = self.entries.read().await;
        let prefix = format!("{}:", user_id);
        Ok(entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            // "u1:" is also a prefix of "u1:x:<hash>"
            .filter(|(_, entry)| entry.request.user_id == user_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}

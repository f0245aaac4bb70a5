//! In-memory store collaborators honoring the full-snapshot contract.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt as _};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;

use super::{FeedStore, Snapshot, SnapshotStream, UserDirectory};
use crate::error::StoreError;
use crate::message::ChatRecord;
use crate::session::User;

const SNAPSHOT_BUFFER: usize = 64;

/// Feed store holding records in insertion order.
///
/// Deliberately never pre-sorts a snapshot: ordering is the consumer's job,
/// exactly as with the real store.
#[derive(Clone)]
pub struct MemoryFeedStore {
    records: Arc<Mutex<Vec<ChatRecord>>>,
    updates: broadcast::Sender<Snapshot>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            updates,
        }
    }

    /// Inject a record as if another client had written it.
    pub async fn push_remote(&self, record: ChatRecord) {
        let snapshot = {
            let mut records = self.records.lock().await;
            records.push(record);
            records.clone()
        };
        let _ = self.updates.send(snapshot);
    }

    /// Raw stored records, in insertion order.
    pub async fn records(&self) -> Vec<ChatRecord> {
        self.records.lock().await.clone()
    }
}

impl Default for MemoryFeedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn append(&self, record: ChatRecord) -> Result<(), StoreError> {
        self.push_remote(record).await;
        Ok(())
    }

    async fn subscribe(&self) -> Result<SnapshotStream, StoreError> {
        // Register with the broadcast before reading the initial set, so an
        // append landing in between is delivered as an update instead of
        // going missing until the next change.
        let updates = self.updates.subscribe();
        let initial = self.records.lock().await.clone();
        // A lagged receiver only skipped intermediate snapshots; every
        // delivery is the full set, so lag is dropped rather than surfaced.
        let live = BroadcastStream::new(updates)
            .filter_map(|next| async move { next.ok().map(Ok::<_, StoreError>) });
        Ok(stream::once(async move { Ok(initial) }).chain(live).boxed())
    }
}

/// Identity directory holding users in registration order.
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<Mutex<Vec<User>>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn append(&self, user: User) -> Result<(), StoreError> {
        self.users.lock().await.push(user);
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().await.clone())
    }
}

//! Collaborator traits for the realtime document store backing the chat.
//!
//! The store is external to this crate; only its contract is fixed here.
//! [`memory`] provides in-process implementations for tests and demos.

pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StoreError;
use crate::message::ChatRecord;
use crate::session::User;

/// A full-set delivery of every record currently in the feed.
pub type Snapshot = Vec<ChatRecord>;

/// Stream of feed snapshots. Dropping the stream releases the subscription;
/// no notification is delivered afterwards.
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, StoreError>>;

/// The shared message feed (the "chats" collection).
///
/// Every change notification carries the full current record set, not a
/// delta, and in no particular order. Consumers replace their view
/// wholesale on each delivery.
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn append(&self, record: ChatRecord) -> Result<(), StoreError>;
    async fn subscribe(&self) -> Result<SnapshotStream, StoreError>;
}

/// The shared identity directory (the "users" collection), used only by
/// directory-registered admission.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn append(&self, user: User) -> Result<(), StoreError>;
    async fn fetch_all(&self) -> Result<Vec<User>, StoreError>;
}

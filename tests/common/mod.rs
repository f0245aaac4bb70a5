//! Shared fakes for the integration tests: a recording router and store
//! collaborators with switchable outages.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt as _;
use lowbat_chat::message::ChatRecord;
use lowbat_chat::session::User;
use lowbat_chat::store::memory::{MemoryFeedStore, MemoryUserDirectory};
use lowbat_chat::store::{FeedStore, SnapshotStream, UserDirectory};
use lowbat_chat::{Route, Router, StoreError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Router that records navigation instead of switching screens.
#[derive(Default)]
pub struct RecordingRouter {
    calls: Mutex<Vec<NavCall>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCall {
    Navigate(Route),
    Back,
}

impl RecordingRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<NavCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<NavCall> {
        self.calls.lock().unwrap().last().copied()
    }
}

impl Router for RecordingRouter {
    fn navigate(&self, route: Route) {
        self.calls.lock().unwrap().push(NavCall::Navigate(route));
    }

    fn go_back(&self) {
        self.calls.lock().unwrap().push(NavCall::Back);
    }
}

/// Feed store whose appends can be switched to fail, simulating a store
/// outage. Reads and subscriptions stay healthy.
pub struct FlakyFeedStore {
    pub inner: MemoryFeedStore,
    fail_appends: AtomicBool,
}

impl FlakyFeedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryFeedStore::new(),
            fail_appends: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeedStore for FlakyFeedStore {
    async fn append(&self, record: ChatRecord) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Write("simulated outage".to_string()));
        }
        self.inner.append(record).await
    }

    async fn subscribe(&self) -> Result<SnapshotStream, StoreError> {
        self.inner.subscribe().await
    }
}

/// Snapshot result fed to a [`ScriptedFeedStore`] subscriber.
pub type ScriptedSnapshot = Result<Vec<ChatRecord>, StoreError>;

/// Feed store whose single subscription replays whatever the test sends,
/// read errors included. Appends are accepted and discarded.
pub struct ScriptedFeedStore {
    feed: Mutex<Option<mpsc::UnboundedReceiver<ScriptedSnapshot>>>,
}

impl ScriptedFeedStore {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<ScriptedSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Arc::new(Self {
            feed: Mutex::new(Some(rx)),
        });
        (store, tx)
    }
}

#[async_trait]
impl FeedStore for ScriptedFeedStore {
    async fn append(&self, _record: ChatRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn subscribe(&self) -> Result<SnapshotStream, StoreError> {
        let rx = self
            .feed
            .lock()
            .unwrap()
            .take()
            .expect("scripted feed supports a single subscription");
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// User directory whose writes can be switched to fail.
pub struct FlakyUserDirectory {
    pub inner: MemoryUserDirectory,
    fail_appends: AtomicBool,
}

impl FlakyUserDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryUserDirectory::new(),
            fail_appends: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for FlakyUserDirectory {
    async fn append(&self, user: User) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Write("simulated outage".to_string()));
        }
        self.inner.append(user).await
    }

    async fn fetch_all(&self) -> Result<Vec<User>, StoreError> {
        self.inner.fetch_all().await
    }
}

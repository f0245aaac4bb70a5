//! The chat feed flow: a live, locally sorted view of the shared message
//! feed plus the send path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt as _;
use tokio::sync::{watch, Mutex as TokioMutex};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

use crate::error::FlowError;
use crate::event::{EventBus, UiEvent};
use crate::message::{now_timestamp, sort_feed, ChatRecord, UNKNOWN_BATTERY};
use crate::session::Session;
use crate::store::{FeedStore, Snapshot};

/// Handle for the live subscription. Dropping it aborts the listener task,
/// so no view update can land after deactivation.
struct ActiveFeed {
    _listener: AbortOnDropHandle<()>,
}

/// Maintains the local feed view while the chat screen is active and
/// appends messages the local user sends.
///
/// The flow owns its subscription lifecycle: [`activate`](Self::activate)
/// acquires it, [`deactivate`](Self::deactivate) (or drop) releases it on
/// every exit path.
pub struct ChatFeedFlow {
    store: Arc<dyn FeedStore>,
    session: Session,
    battery: watch::Receiver<Option<u8>>,
    events: EventBus,
    messages: Arc<Mutex<Vec<ChatRecord>>>,
    compose: Mutex<String>,
    sending: AtomicBool,
    active: TokioMutex<Option<ActiveFeed>>,
}

impl ChatFeedFlow {
    pub fn new(
        store: Arc<dyn FeedStore>,
        session: Session,
        battery: watch::Receiver<Option<u8>>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            session,
            battery,
            events,
            messages: Arc::new(Mutex::new(Vec::new())),
            compose: Mutex::new(String::new()),
            sending: AtomicBool::new(false),
            active: TokioMutex::new(None),
        }
    }

    /// Subscribe to the feed and start applying snapshots. Replaces any
    /// previous subscription.
    pub async fn activate(&self) -> Result<(), FlowError> {
        let mut snapshots = self.store.subscribe().await?;
        let messages = self.messages.clone();
        let events = self.events.clone();

        let listener = AbortOnDropHandle::new(tokio::spawn(async move {
            while let Some(next) = snapshots.next().await {
                match next {
                    Ok(snapshot) => apply_snapshot(&messages, &events, snapshot),
                    Err(e) => {
                        // Keep the last-known-good view and the
                        // subscription; the store may recover.
                        warn!("feed snapshot error: {e}");
                        events.emit(UiEvent::Errored {
                            message: e.to_string(),
                        });
                    }
                }
            }
            info!("feed snapshot stream ended");
        }));

        *self.active.lock().await = Some(ActiveFeed {
            _listener: listener,
        });
        Ok(())
    }

    /// Release the subscription. Synchronous with respect to the view: any
    /// snapshot or send completion arriving later is dropped with the
    /// listener task.
    pub async fn deactivate(&self) {
        if self.active.lock().await.take().is_some() {
            info!("feed subscription released");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Current sorted view of the feed.
    pub fn messages(&self) -> Vec<ChatRecord> {
        self.messages.lock().unwrap().clone()
    }

    /// Compose field draft. Preserved across a failed send.
    pub fn compose(&self) -> String {
        self.compose.lock().unwrap().clone()
    }

    pub fn set_compose(&self, raw: &str) {
        *self.compose.lock().unwrap() = raw.to_string();
    }

    /// Whether the send action should be enabled.
    pub fn send_enabled(&self) -> bool {
        !self.sending.load(Ordering::SeqCst) && !self.compose().trim().is_empty()
    }

    /// Append the composed message to the feed, stamped with the sender's
    /// identity and battery level at this moment.
    ///
    /// A blank draft is a no-op. While an append is in flight further sends
    /// are ignored. On success the compose field clears; on failure it
    /// keeps the unsent text and the error is surfaced for retry.
    pub async fn send(&self) -> Result<(), FlowError> {
        let body = self.compose.lock().unwrap().clone();
        if body.trim().is_empty() {
            return Ok(());
        }
        let user = self.session.user().ok_or(FlowError::NotAdmitted)?;
        if self.sending.swap(true, Ordering::SeqCst) {
            debug!("send already in flight; ignoring");
            return Ok(());
        }

        let record = ChatRecord {
            user_id: user.id,
            user_nickname: user.nickname,
            battery_level: self.battery.borrow().map_or(UNKNOWN_BATTERY, i16::from),
            timestamp: now_timestamp(),
            message: body,
        };
        let result = self.store.append(record).await;
        self.sending.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.compose.lock().unwrap().clear();
                Ok(())
            }
            Err(e) => {
                warn!("message append failed: {e}");
                self.events.emit(UiEvent::Errored {
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Presentation rule for own-message styling: match on id when both the
    /// session user and the record carry one, otherwise fall back to the
    /// nickname.
    pub fn is_mine(&self, record: &ChatRecord) -> bool {
        match self.session.user() {
            None => false,
            Some(user) => match (user.id, record.user_id) {
                (Some(mine), Some(theirs)) => mine == theirs,
                _ => user.nickname == record.user_nickname,
            },
        }
    }
}

/// Replace the local view with a freshly sorted snapshot and notify the
/// frontend. A growing feed also requests a scroll to the newest message.
fn apply_snapshot(
    messages: &Arc<Mutex<Vec<ChatRecord>>>,
    events: &EventBus,
    mut snapshot: Snapshot,
) {
    sort_feed(&mut snapshot);
    let grew = {
        let mut view = messages.lock().unwrap();
        let grew = snapshot.len() > view.len();
        *view = snapshot.clone();
        grew
    };
    events.emit(UiEvent::FeedUpdated { messages: snapshot });
    if grew {
        events.emit(UiEvent::ScrollToEnd);
    }
}

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::message::ChatRecord;

const EVENT_BUFFER: usize = 256;

/// Events pushed outward for a frontend to render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    /// Fresh sorted view of the feed after a snapshot was applied.
    #[serde(rename_all = "camelCase")]
    FeedUpdated { messages: Vec<ChatRecord> },
    /// The feed grew; scroll to the newest message. Best effort only.
    ScrollToEnd,
    /// Admission completed and the chat screen is becoming active.
    #[serde(rename_all = "camelCase")]
    Admitted { nickname: String, id: Option<u32> },
    /// Battery climbed back above the gate threshold; the user is being
    /// sent home. Emitted at most once per admission.
    #[serde(rename_all = "camelCase")]
    BatteryCharged { threshold: u8 },
    /// A recoverable failure the user should see.
    #[serde(rename_all = "camelCase")]
    Errored { message: String },
}

/// Broadcast bus carrying [`UiEvent`]s to however many frontends are
/// listening. Emitting with no listeners is not an error.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("no frontend subscribed; event dropped");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Wire value of `battery_level` when the sender's sensor gave no reading.
pub const UNKNOWN_BATTERY: i16 = -1;

/// One entry in the shared chat feed.
///
/// Field names match the stored document shape. Records are created once by
/// the sending client and never mutated afterwards; in particular
/// `battery_level` is the sender's reading at the moment of send and is
/// never recomputed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRecord {
    /// Directory id of the sender, when the sender registered one.
    pub user_id: Option<u32>,
    /// Nickname of the sender at the time of sending.
    pub user_nickname: String,
    /// Sender's battery percentage at send time, or [`UNKNOWN_BATTERY`].
    pub battery_level: i16,
    /// ISO-8601 timestamp assigned by the sender's clock.
    pub timestamp: String,
    /// Message payload.
    pub message: String,
}

impl ChatRecord {
    /// Send time parsed for ordering. Records whose timestamp does not
    /// parse sort as the Unix epoch.
    pub fn sent_at(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()
    }
}

/// Current time in the format the feed stores: RFC 3339 with millisecond
/// precision and a `Z` suffix.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Order a snapshot ascending by send time.
///
/// The store guarantees nothing about delivery order, so this runs on every
/// snapshot before it replaces the local view. Stable, so records with equal
/// (or unparseable) timestamps keep their delivered order.
pub fn sort_feed(records: &mut [ChatRecord]) {
    records.sort_by_key(ChatRecord::sent_at);
}

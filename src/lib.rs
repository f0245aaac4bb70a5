//! Headless core of a battery-gated chat room client.
//!
//! A user may only enter the single shared room while their battery sits at
//! or below a gate threshold. Admission captures a nickname, optionally
//! registers it in a shared user directory, and hands the identity to the
//! chat feed flow, which mirrors the realtime store's message feed and
//! appends what the user sends. The store, the battery sensor, and the
//! screen router stay behind collaborator traits; in-memory store
//! implementations live in [`store::memory`].

pub mod admission;
pub mod battery;
pub mod error;
pub mod event;
pub mod feed;
pub mod message;
pub mod router;
pub mod session;
pub mod store;

pub use admission::{AdmissionFlow, AdmissionState, IdStrategy, RegistrationPolicy};
pub use battery::{BatteryMonitor, BatterySensor, GATE_THRESHOLD};
pub use error::{FlowError, StoreError};
pub use event::{EventBus, UiEvent};
pub use feed::ChatFeedFlow;
pub use message::ChatRecord;
pub use router::{Route, Router};
pub use session::{Session, User};

/// Install the default tracing subscriber for binaries and demos embedding
/// the crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .pretty()
        .with_ansi(false)
        .init();
}

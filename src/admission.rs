//! Session admission: battery gating, nickname capture, and identity
//! registration ahead of the chat screen.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rand::Rng as _;
use tokio::sync::{watch, Mutex as TokioMutex};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

use crate::battery::gated;
use crate::error::{FlowError, StoreError};
use crate::event::{EventBus, UiEvent};
use crate::router::{Route, Router};
use crate::session::{validate_nickname, Session, User};
use crate::store::UserDirectory;

/// Random ids are sampled from this range before falling back to
/// next-sequential.
const RANDOM_ID_RANGE: std::ops::RangeInclusive<u32> = 1..=9999;
const RANDOM_ID_ATTEMPTS: usize = 100;

/// Where a registered identity lives.
pub enum RegistrationPolicy {
    /// Identity is held only in the shared session. Registration makes no
    /// external call and cannot fail past nickname validation.
    LocalOnly,
    /// Identity is persisted to the shared user directory under a generated
    /// id unique among the ids known at registration time.
    Directory {
        directory: Arc<dyn UserDirectory>,
        ids: IdStrategy,
    },
}

/// How a directory-registered identity picks its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Highest known id plus one, starting at 1.
    NextSequential,
    /// Uniform over a bounded range, rejection-sampled against known ids.
    RandomSampled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    /// Battery above the threshold; entry controls are hidden.
    Gated,
    /// Nickname capture in progress.
    Entering,
    /// Identity registration triggered. Stays here across a failed attempt
    /// so a retry keeps the entered nickname.
    Submitting,
    /// Handoff to the chat flow complete.
    Admitted,
}

/// The admission state machine.
///
/// Constructed per app session with the shared [`Session`] handle it will
/// populate on success. Uniqueness of generated ids is best-effort
/// read-then-write: two admissions racing on the same directory can pick
/// the same id, and no locking is attempted.
pub struct AdmissionFlow {
    session: Session,
    battery: watch::Receiver<Option<u8>>,
    policy: RegistrationPolicy,
    router: Arc<dyn Router>,
    events: EventBus,
    threshold: u8,
    state: Arc<Mutex<AdmissionState>>,
    nickname: Mutex<String>,
    in_flight: AtomicBool,
    regate: TokioMutex<Option<AbortOnDropHandle<()>>>,
}

impl AdmissionFlow {
    pub fn new(
        session: Session,
        battery: watch::Receiver<Option<u8>>,
        policy: RegistrationPolicy,
        router: Arc<dyn Router>,
        events: EventBus,
        threshold: u8,
    ) -> Self {
        let initial = if gated(*battery.borrow(), threshold) {
            AdmissionState::Gated
        } else {
            AdmissionState::Entering
        };
        Self {
            session,
            battery,
            policy,
            router,
            events,
            threshold,
            state: Arc::new(Mutex::new(initial)),
            nickname: Mutex::new(String::new()),
            in_flight: AtomicBool::new(false),
            regate: TokioMutex::new(None),
        }
    }

    pub fn state(&self) -> AdmissionState {
        *self.state.lock().unwrap()
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Latest battery reading, for the entry screen to display.
    pub fn battery_reading(&self) -> Option<u8> {
        *self.battery.borrow()
    }

    /// Re-evaluate the gate against the current battery reading. Called
    /// when the entry screen (re)loads or refreshes.
    pub fn refresh_gate(&self) {
        let mut state = self.state.lock().unwrap();
        match (*state, gated(*self.battery.borrow(), self.threshold)) {
            (AdmissionState::Gated, false) => *state = AdmissionState::Entering,
            (AdmissionState::Entering, true) => *state = AdmissionState::Gated,
            _ => {}
        }
    }

    /// Current nickname draft. Survives a failed submission.
    pub fn nickname(&self) -> String {
        self.nickname.lock().unwrap().clone()
    }

    pub fn set_nickname(&self, raw: &str) {
        *self.nickname.lock().unwrap() = raw.to_string();
    }

    /// Whether the entry action should be enabled.
    pub fn entry_enabled(&self) -> bool {
        self.state() == AdmissionState::Entering
            && validate_nickname(&self.nickname.lock().unwrap()).is_some()
    }

    /// Register the entered identity and, on success, hand off to the chat
    /// screen.
    ///
    /// No-op when a submission is already in flight. A failed registration
    /// leaves the flow in [`AdmissionState::Submitting`] with the nickname
    /// intact, ready for retry.
    pub async fn submit(&self) -> Result<(), FlowError> {
        match self.state() {
            AdmissionState::Gated | AdmissionState::Admitted => {
                return Err(FlowError::NotAdmissible)
            }
            AdmissionState::Entering | AdmissionState::Submitting => {}
        }
        let nickname = {
            let draft = self.nickname.lock().unwrap();
            validate_nickname(&draft)
                .ok_or(FlowError::InvalidNickname)?
                .to_string()
        };
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("submission already in flight; ignoring");
            return Ok(());
        }
        self.set_state(AdmissionState::Submitting);

        let result = self.register(&nickname).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(user) => {
                info!(nickname = %user.nickname, id = ?user.id, "user admitted");
                self.session.set_user(user.clone());
                self.set_state(AdmissionState::Admitted);
                self.events.emit(UiEvent::Admitted {
                    nickname: user.nickname,
                    id: user.id,
                });
                self.arm_regate_watcher().await;
                self.router.navigate(Route::Chat);
                Ok(())
            }
            Err(e) => {
                warn!("identity registration failed: {e}");
                self.events.emit(UiEvent::Errored {
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    async fn register(&self, nickname: &str) -> Result<User, StoreError> {
        match &self.policy {
            RegistrationPolicy::LocalOnly => Ok(User {
                id: None,
                nickname: nickname.to_string(),
            }),
            RegistrationPolicy::Directory { directory, ids } => {
                let known = directory.fetch_all().await?;
                let user = User {
                    id: Some(pick_id(*ids, &known)),
                    nickname: nickname.to_string(),
                };
                directory.append(user.clone()).await?;
                Ok(user)
            }
        }
    }

    fn set_state(&self, next: AdmissionState) {
        *self.state.lock().unwrap() = next;
    }

    /// Watch the battery for the rest of this admission: the first reading
    /// back above the threshold sends the user home with a single notice,
    /// regardless of what they were doing on the chat screen.
    async fn arm_regate_watcher(&self) {
        let mut battery = self.battery.clone();
        let events = self.events.clone();
        let router = self.router.clone();
        let state = self.state.clone();
        let threshold = self.threshold;

        let watcher = AbortOnDropHandle::new(tokio::spawn(async move {
            while battery.changed().await.is_ok() {
                let reading = *battery.borrow_and_update();
                if gated(reading, threshold) {
                    info!(?reading, threshold, "battery charged past the gate; leaving chat");
                    *state.lock().unwrap() = AdmissionState::Gated;
                    events.emit(UiEvent::BatteryCharged { threshold });
                    router.navigate(Route::Home);
                    break;
                }
            }
        }));
        *self.regate.lock().await = Some(watcher);
    }
}

/// Pick an id not currently present in the directory. Best-effort only; the
/// read-then-write window is documented, not masked.
fn pick_id(strategy: IdStrategy, known: &[User]) -> u32 {
    let taken: HashSet<u32> = known.iter().filter_map(|u| u.id).collect();
    let next_sequential = taken.iter().max().map_or(1, |max| max + 1);
    match strategy {
        IdStrategy::NextSequential => next_sequential,
        IdStrategy::RandomSampled => {
            let mut rng = rand::thread_rng();
            for _ in 0..RANDOM_ID_ATTEMPTS {
                let candidate = rng.gen_range(RANDOM_ID_RANGE);
                if !taken.contains(&candidate) {
                    return candidate;
                }
            }
            debug!("random id range looks saturated; falling back to sequential");
            next_sequential
        }
    }
}

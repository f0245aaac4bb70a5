use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Longest nickname the entry field accepts.
pub const MAX_NICKNAME_LEN: usize = 10;

/// A chat participant.
///
/// `id` is present only for identities registered in the shared user
/// directory; locally held identities carry a nickname alone.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<u32>,
    pub nickname: String,
}

/// Returns the trimmed nickname when it is acceptable (1..=10 characters).
pub fn validate_nickname(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    (1..=MAX_NICKNAME_LEN).contains(&len).then_some(trimmed)
}

/// Shared session identity, populated by the admission flow and read by the
/// chat feed flow. Cloning shares the same underlying user.
#[derive(Clone, Default)]
pub struct Session {
    user: Arc<Mutex<Option<User>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active identity, if admission has completed.
    pub fn user(&self) -> Option<User> {
        self.user.lock().unwrap().clone()
    }

    pub fn set_user(&self, user: User) {
        *self.user.lock().unwrap() = Some(user);
    }

    /// Drop the active identity, e.g. when the user is sent back to the
    /// gated screen.
    pub fn clear(&self) {
        *self.user.lock().unwrap() = None;
    }
}

use serde::{Deserialize, Serialize};

/// Screens the flows navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    /// Gated entry screen with the nickname field.
    Home,
    /// The shared chat room.
    Chat,
}

/// Screen router collaborator: push/back navigation by named route.
///
/// Implementations own screen lifecycle; in particular, navigating away
/// from the chat screen is what drives [`crate::feed::ChatFeedFlow`]
/// deactivation.
pub trait Router: Send + Sync {
    fn navigate(&self, route: Route);
    fn go_back(&self);
}

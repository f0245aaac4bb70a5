use thiserror::Error;

/// Failures reported by the external store collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(String),
    #[error("store read failed: {0}")]
    Read(String),
}

/// Everything that can go wrong inside the admission and feed flows.
///
/// No variant is fatal: each one leaves its flow in a state the user can
/// retry from.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("nickname must be 1 to 10 characters")]
    InvalidNickname,
    #[error("entry is not available in the current admission state")]
    NotAdmissible,
    #[error("no active identity; complete admission first")]
    NotAdmitted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

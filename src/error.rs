//! Engine-wide error type returned by every domain service.

use thiserror::Error;

use crate::storage::StoreError;

/// Failures an engine operation can surface to its caller.
///
/// `OverAllocation` is the only recoverable kind: it carries the quantity
/// still available so the caller can offer a smaller claim. `StoreConflict`
/// is returned only after the engine has already exhausted its internal
/// retries for an optimistic-concurrency race.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("requested quantity exceeds the {remaining} remaining")]
    OverAllocation { remaining: u32 },

    #[error("claim quantity must be at least 1")]
    InvalidQuantity,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("a trip must keep at least one admin")]
    LastAdminViolation,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("commit lost a concurrent race and retries were exhausted")]
    StoreConflict,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }

    pub(crate) fn invalid_transition(message: impl Into<String>) -> Self {
        EngineError::InvalidTransition(message.into())
    }

    pub(crate) fn permission_denied(message: impl Into<String>) -> Self {
        EngineError::PermissionDenied(message.into())
    }
}

//! Fire-and-forget notification boundary.
//!
//! The engine tells collaborators about state changes it has already
//! committed. Delivery is somebody else's problem: a sink failure is logged
//! and swallowed, never rolled back into the triggering operation.

use anyhow::Result;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kinds of events the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ClaimSubmitted,
    ClaimAccepted,
    ClaimRejected,
    ClaimCancelled,
    RoleChanged,
    TripCompleted,
    DeliveryUpdated,
    DebtSettled,
    ItemRequested,
    RequestApproved,
    RequestRejected,
}

/// Outbound notification channel (push, email, whatever the host wires in).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, recipient_id: &str, kind: NotificationKind, payload: Value) -> Result<()>;
}

/// Default sink that just logs each notification. Useful for development
/// and as a stand-in when the host has no delivery channel yet.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, recipient_id: &str, kind: NotificationKind, payload: Value) -> Result<()> {
        log::info!("notify {}: {:?} {}", recipient_id, kind, payload);
        Ok(())
    }
}

/// Send a notification, logging and swallowing any sink failure.
pub(crate) fn send_or_log(
    sink: &dyn NotificationSink,
    recipient_id: &str,
    kind: NotificationKind,
    payload: Value,
) {
    if let Err(e) = sink.notify(recipient_id, kind, payload) {
        error!(
            "failed to deliver {:?} notification to {}: {:#}",
            kind, recipient_id, e
        );
    }
}

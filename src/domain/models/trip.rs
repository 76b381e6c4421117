//! Domain model for a trip: the aggregate root of one bulk-purchase event.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Whether the status machine allows moving from `self` to `next`.
    /// A same-status update is handled by the caller as a no-op.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        match self {
            TripStatus::Planned => matches!(
                next,
                TripStatus::InProgress | TripStatus::Completed | TripStatus::Cancelled
            ),
            TripStatus::InProgress => {
                matches!(next, TripStatus::Completed | TripStatus::Cancelled)
            }
            TripStatus::Completed | TripStatus::Cancelled => false,
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a member can be assigned on a trip. The creator is an implicit,
/// permanent admin and is never represented as a `Viewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripRole {
    Admin,
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub creator_id: String,
    /// The member doing the actual bulk purchase; debts run towards them.
    pub shopper_id: String,
    pub admin_ids: Vec<String>,
    pub viewer_ids: Vec<String>,
    pub status: TripStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Doubles as the optimistic-concurrency token for membership writes.
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn generate_id() -> String {
        format!("trip::{}", Uuid::new_v4())
    }

    /// Editors may mutate the item list, membership, and claim decisions.
    pub fn is_editor(&self, user_id: &str) -> bool {
        self.creator_id == user_id || self.admin_ids.iter().any(|id| id == user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.is_editor(user_id) || self.viewer_ids.iter().any(|id| id == user_id)
    }

    /// All editors, creator included. Used as a notification audience.
    pub fn editor_ids(&self) -> Vec<String> {
        let mut ids = self.admin_ids.clone();
        if !ids.iter().any(|id| id == &self.creator_id) {
            ids.push(self.creator_id.clone());
        }
        ids
    }

    /// Every member of the trip, deduplicated.
    pub fn member_ids(&self) -> Vec<String> {
        let mut ids = self.editor_ids();
        for viewer in &self.viewer_ids {
            if !ids.iter().any(|id| id == viewer) {
                ids.push(viewer.clone());
            }
        }
        ids
    }

    /// Promote a user to admin. Per the role model this has no guard: an
    /// existing viewer moves up, anyone else is added directly.
    /// Returns whether the membership actually changed.
    pub fn promote(&mut self, user_id: &str) -> bool {
        if self.is_editor(user_id) {
            return false;
        }
        self.viewer_ids.retain(|id| id != user_id);
        self.admin_ids.push(user_id.to_string());
        true
    }

    /// Demote an admin to viewer, enforcing the role invariants: the admin
    /// set must stay non-empty (checked first, so a sole admin is always a
    /// `LastAdminViolation`), and the creator is never demotable.
    pub fn demote(&mut self, user_id: &str) -> Result<bool, EngineError> {
        if !self.admin_ids.iter().any(|id| id == user_id) {
            if user_id == self.creator_id {
                return Err(EngineError::invalid_transition(
                    "the trip creator cannot be demoted",
                ));
            }
            if self.viewer_ids.iter().any(|id| id == user_id) {
                return Ok(false);
            }
            return Err(EngineError::not_found("member", user_id));
        }
        if self.admin_ids.len() == 1 {
            return Err(EngineError::LastAdminViolation);
        }
        if user_id == self.creator_id {
            return Err(EngineError::invalid_transition(
                "the trip creator cannot be demoted",
            ));
        }
        self.admin_ids.retain(|id| id != user_id);
        self.viewer_ids.push(user_id.to_string());
        Ok(true)
    }

    /// Add a user as a viewer. No-op for existing members.
    pub fn add_viewer(&mut self, user_id: &str) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.viewer_ids.push(user_id.to_string());
        true
    }

    /// Remove a member entirely. Removing an admin runs the demotion
    /// guards first, so the admin set can never be emptied this way.
    pub fn remove_member(&mut self, user_id: &str) -> Result<bool, EngineError> {
        if self.admin_ids.iter().any(|id| id == user_id) {
            if self.admin_ids.len() == 1 {
                return Err(EngineError::LastAdminViolation);
            }
            if user_id == self.creator_id {
                return Err(EngineError::invalid_transition(
                    "the trip creator cannot be removed",
                ));
            }
            self.admin_ids.retain(|id| id != user_id);
            return Ok(true);
        }
        if user_id == self.creator_id {
            return Err(EngineError::invalid_transition(
                "the trip creator cannot be removed",
            ));
        }
        if self.viewer_ids.iter().any(|id| id == user_id) {
            self.viewer_ids.retain(|id| id != user_id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip_with(admins: &[&str], viewers: &[&str]) -> Trip {
        let now = Utc::now();
        Trip {
            id: Trip::generate_id(),
            group_id: "group-1".to_string(),
            name: "Warehouse run".to_string(),
            creator_id: "alice".to_string(),
            shopper_id: "alice".to_string(),
            admin_ids: admins.iter().map(|s| s.to_string()).collect(),
            viewer_ids: viewers.iter().map(|s| s.to_string()).collect(),
            status: TripStatus::Planned,
            scheduled_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn creator_is_always_an_editor() {
        let trip = trip_with(&["alice"], &["bob"]);
        assert!(trip.is_editor("alice"));
        assert!(!trip.is_editor("bob"));
        assert!(trip.is_member("bob"));
        assert!(!trip.is_member("mallory"));
    }

    #[test]
    fn demoting_sole_admin_is_rejected_and_set_unchanged() {
        let mut trip = trip_with(&["alice"], &["bob"]);
        let err = trip.demote("alice").unwrap_err();
        assert!(matches!(err, EngineError::LastAdminViolation));
        assert_eq!(trip.admin_ids, vec!["alice".to_string()]);
        assert_eq!(trip.viewer_ids, vec!["bob".to_string()]);
    }

    #[test]
    fn creator_cannot_be_demoted() {
        let mut trip = trip_with(&["alice", "bob"], &[]);
        let err = trip.demote("alice").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn promote_moves_viewer_into_admin_set() {
        let mut trip = trip_with(&["alice"], &["bob"]);
        assert!(trip.promote("bob"));
        assert!(trip.admin_ids.contains(&"bob".to_string()));
        assert!(trip.viewer_ids.is_empty());
        // promoting again is a no-op
        assert!(!trip.promote("bob"));
    }

    #[test]
    fn demote_with_remaining_admins_moves_to_viewers() {
        let mut trip = trip_with(&["alice", "bob"], &[]);
        assert!(trip.demote("bob").unwrap());
        assert_eq!(trip.admin_ids, vec!["alice".to_string()]);
        assert_eq!(trip.viewer_ids, vec!["bob".to_string()]);
    }

    #[test]
    fn terminal_statuses_accept_no_transition() {
        assert!(!TripStatus::Completed.can_transition_to(TripStatus::InProgress));
        assert!(!TripStatus::Cancelled.can_transition_to(TripStatus::Planned));
        assert!(TripStatus::Planned.can_transition_to(TripStatus::InProgress));
        assert!(TripStatus::InProgress.can_transition_to(TripStatus::Completed));
    }
}

//! Domain model for a claim: one member's reservation against one item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Accepted => "accepted",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and accepted claims hold their quantity; rejected and
    /// cancelled ones release it.
    pub fn counts_against_quantity(&self) -> bool {
        matches!(self, ClaimStatus::Pending | ClaimStatus::Accepted)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Rejected | ClaimStatus::Cancelled)
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub trip_id: String,
    pub item_id: String,
    pub claimer_id: String,
    pub quantity: u32,
    pub status: ClaimStatus,
    /// Completion is a toggle on accepted claims, not a terminal state.
    pub is_completed: bool,
    pub claimed_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Claim {
    pub fn generate_id() -> String {
        format!("claim::{}", Uuid::new_v4())
    }
}

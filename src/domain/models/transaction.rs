//! Domain model for a debt transaction between a claimer and the shopper.
//!
//! Debts are denominated in item-count points, not currency. One
//! transaction may cover several claims made in the same action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Settled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Settled => "settled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTransaction {
    pub id: String,
    pub trip_id: String,
    /// The claimer, who owes.
    pub from_user_id: String,
    /// The shopper, who is owed.
    pub to_user_id: String,
    pub item_points: u32,
    /// The claims this debt covers. Never rewritten after creation.
    pub claim_ids: Vec<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl DebtTransaction {
    pub fn generate_id() -> String {
        format!("txn::{}", Uuid::new_v4())
    }
}

/// Derived balance for one user, recomputed on demand from pending debts.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: String,
    /// Points on pending transactions where the user is the debtor.
    pub total_items_owed: u32,
    /// Points on pending transactions where the user is the creditor.
    pub total_items_owed_to: u32,
}

impl UserBalance {
    pub fn new(user_id: impl Into<String>) -> Self {
        UserBalance {
            user_id: user_id.into(),
            total_items_owed: 0,
            total_items_owed_to: 0,
        }
    }

    /// Positive when the user is owed more than they owe.
    pub fn net(&self) -> i64 {
        i64::from(self.total_items_owed_to) - i64::from(self.total_items_owed)
    }
}

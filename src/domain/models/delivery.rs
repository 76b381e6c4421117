//! Domain model for a delivery: the physical handoff of an accepted claim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    pub trip_id: String,
    pub claim_id: String,
    pub item_id: String,
    /// The trip shopper, who hands the goods over.
    pub deliverer_id: String,
    /// The claimer, who receives them.
    pub receiver_id: String,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub confirmation_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// Delivery ids are derived from the covering claim's id. Generation
    /// for the same claim always writes the same document, so concurrent
    /// completion runs upsert one row instead of duplicating it.
    pub fn id_for_claim(claim_id: &str) -> String {
        format!("delivery::{}", claim_id.trim_start_matches("claim::"))
    }
}

//! Domain model for a shareable item on a trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub category: String,
    /// How many units the shopper intends to buy. Claims reserve slices of
    /// this; the active-claim sum never exceeds it.
    pub total_quantity: u32,
    pub notes: Option<String>,
    /// Opaque URL managed by the media layer; the engine never inspects it.
    pub photo_url: Option<String>,
    /// Optimistic-concurrency token. Every committed claim against this
    /// item bumps it, so racing claimers serialize on the store.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn generate_id() -> String {
        format!("item::{}", Uuid::new_v4())
    }
}

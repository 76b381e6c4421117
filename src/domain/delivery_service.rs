//! Delivery tracker service.
//!
//! Deliveries are generated in bulk when a trip completes, one per
//! accepted claim, and then track the physical handoff independently of
//! claim status. Generation is idempotent two ways: claims that already
//! have a delivery row are skipped, and delivery ids are derived from the
//! claim id, so two completion runs racing past the skip check upsert the
//! same document rather than writing it twice.

use chrono::Utc;
use log::info;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::commands::deliveries::{SetDeliveryCommand, SetDeliveryResult};
use crate::domain::models::{Claim, ClaimStatus, Delivery, Trip};
use crate::error::EngineError;
use crate::notification::{send_or_log, NotificationKind, NotificationSink};
use crate::storage::traits::{ClaimStorage, Connection, DeliveryStorage, WriteOp};

#[derive(Clone)]
pub struct DeliveryService<C: Connection> {
    connection: Arc<C>,
    claim_repository: C::ClaimRepository,
    delivery_repository: C::DeliveryRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl<C: Connection> DeliveryService<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        let claim_repository = connection.create_claim_repository();
        let delivery_repository = connection.create_delivery_repository();
        Self {
            connection,
            claim_repository,
            delivery_repository,
            notifier,
        }
    }

    /// Create delivery rows for every accepted claim on a completed trip.
    /// Claims already covered by a delivery are skipped, so re-running a
    /// completion creates nothing. Returns only the rows created now.
    pub fn generate_for_completed_trip(&self, trip: &Trip) -> Result<Vec<Delivery>, EngineError> {
        let claims = self.claim_repository.list_claims_for_trip(&trip.id)?;
        let existing = self.delivery_repository.list_deliveries_for_trip(&trip.id)?;
        let covered: HashSet<&str> = existing.iter().map(|d| d.claim_id.as_str()).collect();

        let now = Utc::now();
        let new_deliveries: Vec<Delivery> = claims
            .iter()
            .filter(|claim| claim.status == ClaimStatus::Accepted)
            .filter(|claim| !covered.contains(claim.id.as_str()))
            .map(|claim| self.delivery_from_claim(trip, claim, now))
            .collect();

        if new_deliveries.is_empty() {
            info!("trip {} completion: no new deliveries to generate", trip.id);
            return Ok(new_deliveries);
        }

        let ops = new_deliveries
            .iter()
            .cloned()
            .map(WriteOp::PutDelivery)
            .collect();
        self.connection.batch_write(ops)?;

        info!(
            "generated {} delivery record(s) for completed trip {}",
            new_deliveries.len(),
            trip.id
        );
        Ok(new_deliveries)
    }

    fn delivery_from_claim(&self, trip: &Trip, claim: &Claim, now: chrono::DateTime<Utc>) -> Delivery {
        Delivery {
            id: Delivery::id_for_claim(&claim.id),
            trip_id: trip.id.clone(),
            claim_id: claim.id.clone(),
            item_id: claim.item_id.clone(),
            deliverer_id: trip.shopper_id.clone(),
            receiver_id: claim.claimer_id.clone(),
            is_delivered: false,
            delivered_at: None,
            confirmation_note: None,
            created_at: now,
        }
    }

    /// Mark a delivery handed over, or take that back. Unlike settlement
    /// this is reversible: un-marking clears the stamp and the note.
    pub fn set_delivery_state(
        &self,
        command: SetDeliveryCommand,
    ) -> Result<SetDeliveryResult, EngineError> {
        let mut delivery = self
            .delivery_repository
            .get_delivery(&command.delivery_id)?
            .ok_or_else(|| EngineError::not_found("delivery", &command.delivery_id))?;

        if command.actor_id != delivery.deliverer_id && command.actor_id != delivery.receiver_id {
            return Err(EngineError::permission_denied(format!(
                "{} is not a party to delivery {}",
                command.actor_id, delivery.id
            )));
        }

        if command.delivered {
            delivery.is_delivered = true;
            delivery.delivered_at = Some(Utc::now());
            delivery.confirmation_note = command.confirmation_note;
        } else {
            delivery.is_delivered = false;
            delivery.delivered_at = None;
            delivery.confirmation_note = None;
        }
        self.delivery_repository.update_delivery(&delivery)?;

        info!(
            "delivery {} marked {} by {}",
            delivery.id,
            if delivery.is_delivered { "delivered" } else { "not delivered" },
            command.actor_id
        );
        let counterparty = if command.actor_id == delivery.deliverer_id {
            delivery.receiver_id.clone()
        } else {
            delivery.deliverer_id.clone()
        };
        send_or_log(
            self.notifier.as_ref(),
            &counterparty,
            NotificationKind::DeliveryUpdated,
            json!({
                "trip_id": delivery.trip_id,
                "delivery_id": delivery.id,
                "is_delivered": delivery.is_delivered,
            }),
        );
        Ok(SetDeliveryResult { delivery })
    }

    pub fn list_deliveries_for_trip(&self, trip_id: &str) -> Result<Vec<Delivery>, EngineError> {
        Ok(self.delivery_repository.list_deliveries_for_trip(trip_id)?)
    }
}

//! Claim lifecycle service.
//!
//! Owns claim creation (always paired, atomically, with one covering debt
//! transaction), the accept/reject/cancel transitions, and the completion
//! toggle. Quantity validation is re-run inside the commit via item
//! version preconditions so concurrent claimers can never overcommit.

use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

use crate::domain::commands::claims::{
    CancelClaimCommand, CancelClaimResult, ClaimEntry, CreateClaimsCommand, CreateClaimsResult,
    ItemAvailability, RespondToClaimCommand, RespondToClaimResult, SetClaimCompletionCommand,
    SetClaimCompletionResult,
};
use crate::domain::models::{Claim, ClaimStatus, DebtTransaction, TransactionStatus, Trip};
use crate::domain::{quantity, MAX_COMMIT_ATTEMPTS};
use crate::error::EngineError;
use crate::notification::{send_or_log, NotificationKind, NotificationSink};
use crate::storage::traits::{ClaimStorage, Connection, ItemStorage, TripStorage, WriteOp};

#[derive(Clone)]
pub struct ClaimService<C: Connection> {
    connection: Arc<C>,
    trip_repository: C::TripRepository,
    item_repository: C::ItemRepository,
    claim_repository: C::ClaimRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl<C: Connection> ClaimService<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        let trip_repository = connection.create_trip_repository();
        let item_repository = connection.create_item_repository();
        let claim_repository = connection.create_claim_repository();
        Self {
            connection,
            trip_repository,
            item_repository,
            claim_repository,
            notifier,
        }
    }

    /// Claim one or more items in a single action.
    ///
    /// All new claims and exactly one debt transaction covering them are
    /// committed together. A lost optimistic-concurrency race is retried
    /// with fresh reads; after the retries are exhausted the caller gets
    /// `StoreConflict`.
    pub fn create_claims(&self, command: CreateClaimsCommand) -> Result<CreateClaimsResult, EngineError> {
        let entries = merge_entries(&command.entries)?;

        let trip = self.require_trip(&command.trip_id)?;
        if !trip.is_member(&command.claimer_id) {
            return Err(EngineError::permission_denied(format!(
                "{} is not a member of trip {}",
                command.claimer_id, trip.id
            )));
        }
        if trip.status.is_terminal() {
            return Err(EngineError::invalid_transition(format!(
                "cannot claim items on a {} trip",
                trip.status
            )));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            match self.try_commit_claims(&trip, &command.claimer_id, &entries) {
                Ok(result) => {
                    info!(
                        "{} claimed {} item(s) on trip {} ({} points)",
                        command.claimer_id,
                        result.claims.len(),
                        trip.id,
                        result.transaction.item_points
                    );
                    if trip.shopper_id != command.claimer_id {
                        send_or_log(
                            self.notifier.as_ref(),
                            &trip.shopper_id,
                            NotificationKind::ClaimSubmitted,
                            json!({
                                "trip_id": trip.id,
                                "claimer_id": command.claimer_id,
                                "claim_ids": result.claims.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
                                "item_points": result.transaction.item_points,
                            }),
                        );
                    }
                    return Ok(result);
                }
                Err(EngineError::Storage(crate::storage::StoreError::Conflict)) => {
                    warn!(
                        "claim commit on trip {} lost a concurrent race (attempt {}/{})",
                        trip.id, attempt, MAX_COMMIT_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::StoreConflict)
    }

    fn try_commit_claims(
        &self,
        trip: &Trip,
        claimer_id: &str,
        entries: &[ClaimEntry],
    ) -> Result<CreateClaimsResult, EngineError> {
        let now = Utc::now();
        let mut ops = Vec::new();
        let mut claims = Vec::new();
        let mut total_points: u32 = 0;

        for entry in entries {
            let mut item = self
                .item_repository
                .get_item(&entry.item_id)?
                .filter(|item| item.trip_id == trip.id)
                .ok_or_else(|| EngineError::not_found("item", &entry.item_id))?;
            let existing = self.claim_repository.list_claims_for_item(&item.id)?;
            quantity::validate_claim(&item, &existing, entry.quantity)?;

            ops.push(WriteOp::CheckItemVersion {
                item_id: item.id.clone(),
                expected: item.version,
            });
            item.version += 1;
            ops.push(WriteOp::PutItem(item.clone()));

            let claim = Claim {
                id: Claim::generate_id(),
                trip_id: trip.id.clone(),
                item_id: item.id,
                claimer_id: claimer_id.to_string(),
                quantity: entry.quantity,
                status: ClaimStatus::Pending,
                is_completed: false,
                claimed_at: now,
                completed_at: None,
            };
            ops.push(WriteOp::PutClaim(claim.clone()));
            total_points = total_points
                .checked_add(entry.quantity)
                .ok_or(EngineError::InvalidQuantity)?;
            claims.push(claim);
        }

        let transaction = DebtTransaction {
            id: DebtTransaction::generate_id(),
            trip_id: trip.id.clone(),
            from_user_id: claimer_id.to_string(),
            to_user_id: trip.shopper_id.clone(),
            item_points: total_points,
            claim_ids: claims.iter().map(|claim| claim.id.clone()).collect(),
            status: TransactionStatus::Pending,
            created_at: now,
            settled_at: None,
        };
        ops.push(WriteOp::PutDebt(transaction.clone()));

        self.connection.atomic_write(ops)?;
        Ok(CreateClaimsResult { claims, transaction })
    }

    /// Accept or reject a pending claim. Editors only.
    pub fn respond_to_claim(
        &self,
        command: RespondToClaimCommand,
    ) -> Result<RespondToClaimResult, EngineError> {
        let mut claim = self.require_claim(&command.claim_id)?;
        let trip = self.require_trip(&claim.trip_id)?;
        if !trip.is_editor(&command.responder_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not decide claims on trip {}",
                command.responder_id, trip.id
            )));
        }
        if claim.status != ClaimStatus::Pending {
            return Err(EngineError::invalid_transition(format!(
                "cannot decide a {} claim",
                claim.status
            )));
        }

        claim.status = if command.accept {
            ClaimStatus::Accepted
        } else {
            ClaimStatus::Rejected
        };
        self.claim_repository.update_claim(&claim)?;

        info!(
            "claim {} {} by {}",
            claim.id,
            claim.status,
            command.responder_id
        );
        let kind = if command.accept {
            NotificationKind::ClaimAccepted
        } else {
            NotificationKind::ClaimRejected
        };
        send_or_log(
            self.notifier.as_ref(),
            &claim.claimer_id,
            kind,
            json!({ "trip_id": claim.trip_id, "claim_id": claim.id }),
        );
        Ok(RespondToClaimResult { claim })
    }

    /// Cancel a pending or accepted claim, releasing its quantity.
    /// Allowed for the claimer and for trip editors.
    pub fn cancel_claim(&self, command: CancelClaimCommand) -> Result<CancelClaimResult, EngineError> {
        let mut claim = self.require_claim(&command.claim_id)?;
        let trip = self.require_trip(&claim.trip_id)?;
        if command.actor_id != claim.claimer_id && !trip.is_editor(&command.actor_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not cancel claim {}",
                command.actor_id, claim.id
            )));
        }
        if claim.status.is_terminal() {
            return Err(EngineError::invalid_transition(format!(
                "cannot cancel a {} claim",
                claim.status
            )));
        }

        claim.status = ClaimStatus::Cancelled;
        claim.is_completed = false;
        claim.completed_at = None;
        self.claim_repository.update_claim(&claim)?;

        info!("claim {} cancelled by {}", claim.id, command.actor_id);
        if trip.shopper_id != command.actor_id {
            send_or_log(
                self.notifier.as_ref(),
                &trip.shopper_id,
                NotificationKind::ClaimCancelled,
                json!({ "trip_id": claim.trip_id, "claim_id": claim.id }),
            );
        }
        Ok(CancelClaimResult { claim })
    }

    /// Toggle completion on an accepted claim. Allowed for the claimer and
    /// for trip editors. Also reports whether every accepted claim on the
    /// trip is now completed.
    pub fn set_claim_completion(
        &self,
        command: SetClaimCompletionCommand,
    ) -> Result<SetClaimCompletionResult, EngineError> {
        let mut claim = self.require_claim(&command.claim_id)?;
        let trip = self.require_trip(&claim.trip_id)?;
        if command.actor_id != claim.claimer_id && !trip.is_editor(&command.actor_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not toggle completion on claim {}",
                command.actor_id, claim.id
            )));
        }
        if claim.status != ClaimStatus::Accepted {
            return Err(EngineError::invalid_transition(format!(
                "completion applies to accepted claims, not {} ones",
                claim.status
            )));
        }

        claim.is_completed = command.completed;
        claim.completed_at = if command.completed { Some(Utc::now()) } else { None };
        self.claim_repository.update_claim(&claim)?;

        let trip_claims = self.claim_repository.list_claims_for_trip(&claim.trip_id)?;
        let all_accepted_completed = trip_claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Accepted)
            .all(|c| c.is_completed);

        info!(
            "claim {} completion set to {} (trip fully completed: {})",
            claim.id, command.completed, all_accepted_completed
        );
        Ok(SetClaimCompletionResult {
            claim,
            all_accepted_completed,
        })
    }

    /// Claim arithmetic snapshot for one item.
    pub fn item_availability(&self, item_id: &str) -> Result<ItemAvailability, EngineError> {
        let item = self
            .item_repository
            .get_item(item_id)?
            .ok_or_else(|| EngineError::not_found("item", item_id))?;
        let claims = self.claim_repository.list_claims_for_item(item_id)?;
        let claimed = quantity::claimed_quantity(&claims);
        let remaining = quantity::remaining_quantity(&item, &claims);
        Ok(ItemAvailability {
            item,
            claimed_quantity: claimed,
            remaining_quantity: remaining,
        })
    }

    pub fn list_claims_for_trip(&self, trip_id: &str) -> Result<Vec<Claim>, EngineError> {
        Ok(self.claim_repository.list_claims_for_trip(trip_id)?)
    }

    fn require_trip(&self, trip_id: &str) -> Result<Trip, EngineError> {
        self.trip_repository
            .get_trip(trip_id)?
            .ok_or_else(|| EngineError::not_found("trip", trip_id))
    }

    fn require_claim(&self, claim_id: &str) -> Result<Claim, EngineError> {
        self.claim_repository
            .get_claim(claim_id)?
            .ok_or_else(|| EngineError::not_found("claim", claim_id))
    }
}

/// Collapse duplicate item entries so a batch is validated per item as a
/// whole, and reject empty or zero-quantity input up front.
fn merge_entries(entries: &[ClaimEntry]) -> Result<Vec<ClaimEntry>, EngineError> {
    if entries.is_empty() {
        return Err(EngineError::InvalidQuantity);
    }
    let mut merged: Vec<ClaimEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.quantity < 1 {
            return Err(EngineError::InvalidQuantity);
        }
        match merged.iter_mut().find(|e| e.item_id == entry.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(entry.quantity)
                    .ok_or(EngineError::InvalidQuantity)?;
            }
            None => merged.push(entry.clone()),
        }
    }
    Ok(merged)
}

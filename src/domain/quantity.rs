//! Quantity ledger: pure arithmetic over an item and its claims.
//!
//! These functions are evaluated twice per claim: once for the caller's
//! sake before batching, and again inside the atomic commit so concurrent
//! claimers can never overcommit an item.

use crate::domain::models::{Claim, Item};
use crate::error::EngineError;

/// Sum of quantities held by active (pending or accepted) claims.
pub fn claimed_quantity(claims: &[Claim]) -> u32 {
    claims
        .iter()
        .filter(|claim| claim.status.counts_against_quantity())
        .map(|claim| claim.quantity)
        .sum()
}

/// Units still available on the item. The subtraction saturates as a
/// read-side clamp; mutation paths keep the true value non-negative.
pub fn remaining_quantity(item: &Item, claims: &[Claim]) -> u32 {
    item.total_quantity.saturating_sub(claimed_quantity(claims))
}

/// Validate a proposed claim quantity against the item's remaining units.
pub fn validate_claim(item: &Item, claims: &[Claim], proposed: u32) -> Result<(), EngineError> {
    if proposed < 1 {
        return Err(EngineError::InvalidQuantity);
    }
    let remaining = remaining_quantity(item, claims);
    if proposed > remaining {
        return Err(EngineError::OverAllocation { remaining });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ClaimStatus;
    use chrono::Utc;

    fn item(total: u32) -> Item {
        Item {
            id: Item::generate_id(),
            trip_id: "trip::t".to_string(),
            name: "Olive oil 5L".to_string(),
            category: "Pantry".to_string(),
            total_quantity: total,
            notes: None,
            photo_url: None,
            version: 0,
            created_at: Utc::now(),
        }
    }

    fn claim(item: &Item, quantity: u32, status: ClaimStatus) -> Claim {
        Claim {
            id: Claim::generate_id(),
            trip_id: item.trip_id.clone(),
            item_id: item.id.clone(),
            claimer_id: "user".to_string(),
            quantity,
            status,
            is_completed: false,
            claimed_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn only_active_claims_count() {
        let item = item(10);
        let claims = vec![
            claim(&item, 3, ClaimStatus::Pending),
            claim(&item, 2, ClaimStatus::Accepted),
            claim(&item, 4, ClaimStatus::Rejected),
            claim(&item, 1, ClaimStatus::Cancelled),
        ];
        assert_eq!(claimed_quantity(&claims), 5);
        assert_eq!(remaining_quantity(&item, &claims), 5);
    }

    #[test]
    fn over_allocation_reports_remaining() {
        let item = item(10);
        let claims = vec![claim(&item, 6, ClaimStatus::Accepted)];
        let err = validate_claim(&item, &claims, 5).unwrap_err();
        match err {
            EngineError::OverAllocation { remaining } => assert_eq!(remaining, 4),
            other => panic!("expected OverAllocation, got {other:?}"),
        }
    }

    #[test]
    fn exact_fit_is_accepted() {
        let item = item(10);
        let claims = vec![claim(&item, 6, ClaimStatus::Accepted)];
        assert!(validate_claim(&item, &claims, 4).is_ok());
        assert_eq!(remaining_quantity(&item, &[claims[0].clone(), claim(&item, 4, ClaimStatus::Pending)]), 0);
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let item = item(10);
        assert!(matches!(
            validate_claim(&item, &[], 0),
            Err(EngineError::InvalidQuantity)
        ));
    }

    #[test]
    fn remaining_clamps_at_zero_for_legacy_overcommit() {
        // Historical data may hold more than total_quantity; reads clamp.
        let item = item(5);
        let claims = vec![claim(&item, 9, ClaimStatus::Accepted)];
        assert_eq!(remaining_quantity(&item, &claims), 0);
    }
}

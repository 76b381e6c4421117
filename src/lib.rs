//! # splitcart-engine
//!
//! Claim & settlement engine for shared bulk-purchase trips: one member
//! buys in bulk, others claim fractions of each item, and the engine
//! arbitrates concurrent claims, keeps the debt ledger between claimers
//! and the shopper, drives delivery tracking once a trip completes, and
//! enforces the trip's role model.
//!
//! The engine is a library behind whatever API a host exposes. It takes
//! its durable store and notification sink as injected interfaces; the
//! bundled [`MemoryConnection`] is both the test double and a usable
//! small-scale backend.

pub mod domain;
pub mod error;
pub mod notification;
pub mod storage;

pub use error::EngineError;
pub use notification::{LogNotifier, NotificationKind, NotificationSink};
pub use storage::memory::MemoryConnection;
pub use storage::traits::Connection;

use std::sync::Arc;

use domain::{ClaimService, DeliveryService, RequestService, TransactionService, TripService};

/// Facade wiring every service onto one connection and sink.
pub struct Engine<C: Connection> {
    pub trip_service: TripService<C>,
    pub claim_service: ClaimService<C>,
    pub transaction_service: TransactionService<C>,
    pub delivery_service: DeliveryService<C>,
    pub request_service: RequestService<C>,
}

impl<C: Connection> Engine<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        Engine {
            trip_service: TripService::new(connection.clone(), notifier.clone()),
            claim_service: ClaimService::new(connection.clone(), notifier.clone()),
            transaction_service: TransactionService::new(connection.clone(), notifier.clone()),
            delivery_service: DeliveryService::new(connection.clone(), notifier.clone()),
            request_service: RequestService::new(connection, notifier),
        }
    }
}

impl Engine<MemoryConnection> {
    /// Engine over a fresh in-memory store with log-only notifications.
    pub fn in_memory() -> Self {
        Engine::new(
            Arc::new(MemoryConnection::new()),
            Arc::new(LogNotifier),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::commands::claims::{ClaimEntry, CreateClaimsCommand, RespondToClaimCommand};
    use domain::commands::transactions::UserBalanceQuery;
    use domain::commands::trips::{AddItemCommand, CreateTripCommand, UpdateTripStatusCommand};
    use domain::models::TripStatus;

    /// The full worked scenario: a 10-unit item, claims of 6, 5 and 4,
    /// then completion generating one delivery per accepted claim.
    #[test]
    fn shared_item_scenario_end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let engine = Engine::in_memory();

        let trip = engine
            .trip_service
            .create_trip(CreateTripCommand {
                group_id: "house-7".to_string(),
                name: "Saturday warehouse run".to_string(),
                creator_id: "shopper".to_string(),
                shopper_id: None,
                viewer_ids: vec!["a".to_string(), "b".to_string()],
                scheduled_date: None,
            })
            .unwrap()
            .trip;
        let item = engine
            .trip_service
            .add_item(AddItemCommand {
                trip_id: trip.id.clone(),
                actor_id: "shopper".to_string(),
                name: "Toilet paper 48-pack".to_string(),
                category: "Household".to_string(),
                total_quantity: 10,
                notes: None,
                photo_url: None,
            })
            .unwrap()
            .item;

        // A claims 6: accepted, 4 remain.
        let a = engine
            .claim_service
            .create_claims(CreateClaimsCommand {
                trip_id: trip.id.clone(),
                claimer_id: "a".to_string(),
                entries: vec![ClaimEntry { item_id: item.id.clone(), quantity: 6 }],
            })
            .unwrap();
        engine
            .claim_service
            .respond_to_claim(RespondToClaimCommand {
                claim_id: a.claims[0].id.clone(),
                responder_id: "shopper".to_string(),
                accept: true,
            })
            .unwrap();
        assert_eq!(
            engine.claim_service.item_availability(&item.id).unwrap().remaining_quantity,
            4
        );

        // B asks for 5: over-allocation, told 4 remain.
        let err = engine
            .claim_service
            .create_claims(CreateClaimsCommand {
                trip_id: trip.id.clone(),
                claimer_id: "b".to_string(),
                entries: vec![ClaimEntry { item_id: item.id.clone(), quantity: 5 }],
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::OverAllocation { remaining: 4 }));

        // B retries with 4: accepted, item exhausted.
        let b = engine
            .claim_service
            .create_claims(CreateClaimsCommand {
                trip_id: trip.id.clone(),
                claimer_id: "b".to_string(),
                entries: vec![ClaimEntry { item_id: item.id.clone(), quantity: 4 }],
            })
            .unwrap();
        engine
            .claim_service
            .respond_to_claim(RespondToClaimCommand {
                claim_id: b.claims[0].id.clone(),
                responder_id: "shopper".to_string(),
                accept: true,
            })
            .unwrap();
        assert_eq!(
            engine.claim_service.item_availability(&item.id).unwrap().remaining_quantity,
            0
        );

        // Debt ledger reflects both pending transactions.
        let shopper_balance = engine
            .transaction_service
            .user_balance(UserBalanceQuery { user_id: "shopper".to_string(), trip_id: None })
            .unwrap()
            .balance;
        assert_eq!(shopper_balance.total_items_owed_to, 10);

        // Completion creates exactly two deliveries, both undelivered.
        let completed = engine
            .trip_service
            .update_trip_status(UpdateTripStatusCommand {
                trip_id: trip.id.clone(),
                actor_id: "shopper".to_string(),
                status: TripStatus::Completed,
            })
            .unwrap();
        assert_eq!(completed.deliveries_created.len(), 2);
        assert!(completed.deliveries_created.iter().all(|d| !d.is_delivered));

        let deliveries = engine.delivery_service.list_deliveries_for_trip(&trip.id).unwrap();
        assert_eq!(deliveries.len(), 2);
        let receivers: Vec<_> = deliveries.iter().map(|d| d.receiver_id.as_str()).collect();
        assert!(receivers.contains(&"a") && receivers.contains(&"b"));
    }

    /// The quantity invariant holds across the whole claim lifecycle.
    #[test]
    fn active_claims_never_exceed_total_quantity() {
        let engine = Engine::in_memory();
        let trip = engine
            .trip_service
            .create_trip(CreateTripCommand {
                group_id: "g".to_string(),
                name: "Run".to_string(),
                creator_id: "s".to_string(),
                shopper_id: None,
                viewer_ids: vec!["u1".to_string(), "u2".to_string(), "u3".to_string()],
                scheduled_date: None,
            })
            .unwrap()
            .trip;
        let item = engine
            .trip_service
            .add_item(AddItemCommand {
                trip_id: trip.id.clone(),
                actor_id: "s".to_string(),
                name: "Coffee beans".to_string(),
                category: "Pantry".to_string(),
                total_quantity: 7,
                notes: None,
                photo_url: None,
            })
            .unwrap()
            .item;

        for (user, quantity) in [("u1", 3u32), ("u2", 4), ("u3", 2)] {
            let _ = engine.claim_service.create_claims(CreateClaimsCommand {
                trip_id: trip.id.clone(),
                claimer_id: user.to_string(),
                entries: vec![ClaimEntry { item_id: item.id.clone(), quantity }],
            });
            let availability = engine.claim_service.item_availability(&item.id).unwrap();
            assert!(availability.claimed_quantity <= item.total_quantity);
        }
        // u3's claim of 2 could not fit after 3 + 4
        let availability = engine.claim_service.item_availability(&item.id).unwrap();
        assert_eq!(availability.claimed_quantity, 7);
        assert_eq!(availability.remaining_quantity, 0);
    }
}

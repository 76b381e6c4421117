//! Storage abstraction traits.
//!
//! The domain layer talks to typed per-entity repositories plus two write
//! entry points on the connection: `atomic_write` (transactional, with
//! version preconditions — the read-modify-write primitive for claim
//! creation and membership changes) and `batch_write` (all-or-nothing bulk
//! writes with no preconditions). Any backing store with conditional
//! multi-document transactions can implement these.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::models::{Claim, DebtTransaction, Delivery, Item, ItemRequest, Trip};

/// Failures the storage layer can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write precondition failed: a document changed between the read
    /// and the commit. The engine retries these a bounded number of times.
    #[error("write precondition failed: document changed concurrently")]
    Conflict,

    /// The store's lock or session is unusable; infrastructure failure.
    #[error("storage lock poisoned")]
    Poisoned,

    /// The adapter could not map a stored document onto the schema.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// An operation that is not valid for the entry point it was given,
    /// e.g. a precondition inside a batch write.
    #[error("unsupported write op: {0}")]
    Unsupported(&'static str),
}

/// One document write (or precondition) inside an atomic or batch commit.
///
/// `Put*` ops are upserts. `Check*` ops assert a document is still in the
/// state the caller read; any failed check fails the whole commit with
/// `StoreError::Conflict` and applies nothing.
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutTrip(Trip),
    PutItem(Item),
    PutClaim(Claim),
    PutDebt(DebtTransaction),
    PutDelivery(Delivery),
    PutRequest(ItemRequest),
    CheckItemVersion { item_id: String, expected: u64 },
    CheckTripUpdatedAt { trip_id: String, expected: DateTime<Utc> },
}

pub trait TripStorage: Send + Sync {
    fn store_trip(&self, trip: &Trip) -> Result<(), StoreError>;
    fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, StoreError>;
    /// Broad scan; callers filter by membership in memory.
    fn list_trips(&self) -> Result<Vec<Trip>, StoreError>;
}

pub trait ItemStorage: Send + Sync {
    fn store_item(&self, item: &Item) -> Result<(), StoreError>;
    fn get_item(&self, item_id: &str) -> Result<Option<Item>, StoreError>;
    fn list_items_for_trip(&self, trip_id: &str) -> Result<Vec<Item>, StoreError>;
}

pub trait ClaimStorage: Send + Sync {
    fn get_claim(&self, claim_id: &str) -> Result<Option<Claim>, StoreError>;
    /// Status/completion updates. New claims are only ever written through
    /// `atomic_write`, paired with their debt transaction.
    fn update_claim(&self, claim: &Claim) -> Result<(), StoreError>;
    fn list_claims_for_item(&self, item_id: &str) -> Result<Vec<Claim>, StoreError>;
    fn list_claims_for_trip(&self, trip_id: &str) -> Result<Vec<Claim>, StoreError>;
}

pub trait DebtStorage: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Option<DebtTransaction>, StoreError>;
    fn update_transaction(&self, transaction: &DebtTransaction) -> Result<(), StoreError>;
    fn list_transactions_for_trip(&self, trip_id: &str) -> Result<Vec<DebtTransaction>, StoreError>;
    /// All transactions where the user is debtor or creditor.
    fn list_transactions_for_user(&self, user_id: &str) -> Result<Vec<DebtTransaction>, StoreError>;
}

pub trait DeliveryStorage: Send + Sync {
    fn get_delivery(&self, delivery_id: &str) -> Result<Option<Delivery>, StoreError>;
    fn update_delivery(&self, delivery: &Delivery) -> Result<(), StoreError>;
    fn list_deliveries_for_trip(&self, trip_id: &str) -> Result<Vec<Delivery>, StoreError>;
}

pub trait ItemRequestStorage: Send + Sync {
    fn store_request(&self, request: &ItemRequest) -> Result<(), StoreError>;
    fn get_request(&self, request_id: &str) -> Result<Option<ItemRequest>, StoreError>;
    fn list_requests_for_trip(&self, trip_id: &str) -> Result<Vec<ItemRequest>, StoreError>;
}

/// Factory for repositories plus the transactional write entry points.
///
/// Abstracts the backing store so the domain layer can run against the
/// bundled in-memory adapter or any remote document store without change.
pub trait Connection: Send + Sync + Clone + 'static {
    type TripRepository: TripStorage + Clone;
    type ItemRepository: ItemStorage + Clone;
    type ClaimRepository: ClaimStorage + Clone;
    type DebtRepository: DebtStorage + Clone;
    type DeliveryRepository: DeliveryStorage + Clone;
    type RequestRepository: ItemRequestStorage + Clone;

    fn create_trip_repository(&self) -> Self::TripRepository;
    fn create_item_repository(&self) -> Self::ItemRepository;
    fn create_claim_repository(&self) -> Self::ClaimRepository;
    fn create_debt_repository(&self) -> Self::DebtRepository;
    fn create_delivery_repository(&self) -> Self::DeliveryRepository;
    fn create_request_repository(&self) -> Self::RequestRepository;

    /// Serializable all-or-nothing commit. Every `Check*` op is verified
    /// against current state before any `Put*` is applied; a failed check
    /// returns `StoreError::Conflict` and applies nothing.
    fn atomic_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// All-or-nothing bulk write without preconditions. `Check*` ops are
    /// rejected as `Unsupported`.
    fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

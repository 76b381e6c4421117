//! Domain layer: the claim & settlement business logic.
//!
//! Services validate an actor's command against the quantity and role
//! invariants, commit the result atomically through the storage layer, and
//! fire notifications after the fact. They are storage-agnostic: any
//! `Connection` implementation works, and tests run on the in-memory one.

pub mod claim_service;
pub mod commands;
pub mod delivery_service;
pub mod models;
pub mod quantity;
pub mod request_service;
pub mod transaction_service;
pub mod trip_service;

pub use claim_service::ClaimService;
pub use delivery_service::DeliveryService;
pub use request_service::RequestService;
pub use transaction_service::TransactionService;
pub use trip_service::TripService;

/// How many times an optimistic commit is retried after losing a race
/// before the failure surfaces as `EngineError::StoreConflict`.
pub(crate) const MAX_COMMIT_ATTEMPTS: usize = 3;

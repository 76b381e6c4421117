//! In-memory storage backend.
//!
//! One repository per entity over a shared `MemoryConnection`, mirroring
//! how a durable adapter would be laid out. Everything lives behind a
//! single lock, which makes the atomic-write contract trivial to honor.

mod claim_repository;
mod connection;
mod debt_repository;
mod delivery_repository;
mod item_repository;
mod request_repository;
mod trip_repository;

pub use claim_repository::MemoryClaimRepository;
pub use connection::MemoryConnection;
pub use debt_repository::MemoryDebtRepository;
pub use delivery_repository::MemoryDeliveryRepository;
pub use item_repository::MemoryItemRepository;
pub use request_repository::MemoryRequestRepository;
pub use trip_repository::MemoryTripRepository;

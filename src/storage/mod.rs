//! Storage layer: abstraction traits plus the bundled in-memory adapter.

pub mod memory;
pub mod traits;

pub use memory::MemoryConnection;
pub use traits::{
    ClaimStorage, Connection, DebtStorage, DeliveryStorage, ItemRequestStorage, ItemStorage,
    StoreError, TripStorage, WriteOp,
};

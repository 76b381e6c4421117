//! Strongly-typed domain entities. The storage adapter is the only place
//! these are (de)serialized; domain logic works on the structs directly.

pub mod claim;
pub mod delivery;
pub mod item;
pub mod item_request;
pub mod transaction;
pub mod trip;

pub use claim::{Claim, ClaimStatus};
pub use delivery::Delivery;
pub use item::Item;
pub use item_request::{ItemRequest, RequestStatus};
pub use transaction::{DebtTransaction, TransactionStatus, UserBalance};
pub use trip::{Trip, TripRole, TripStatus};

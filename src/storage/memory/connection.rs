//! In-memory store connection.
//!
//! Holds every collection in a single `RwLock`ed database so atomic and
//! batch writes are serializable by construction. This is the substitution
//! point for tests and for hosts that have not wired a durable store yet.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::models::{Claim, DebtTransaction, Delivery, Item, ItemRequest, Trip};
use crate::storage::traits::{Connection, StoreError, WriteOp};

use super::claim_repository::MemoryClaimRepository;
use super::debt_repository::MemoryDebtRepository;
use super::delivery_repository::MemoryDeliveryRepository;
use super::item_repository::MemoryItemRepository;
use super::request_repository::MemoryRequestRepository;
use super::trip_repository::MemoryTripRepository;

#[derive(Debug, Default)]
pub(super) struct MemoryDb {
    pub trips: BTreeMap<String, Trip>,
    pub items: BTreeMap<String, Item>,
    pub claims: BTreeMap<String, Claim>,
    pub debts: BTreeMap<String, DebtTransaction>,
    pub deliveries: BTreeMap<String, Delivery>,
    pub requests: BTreeMap<String, ItemRequest>,
}

/// Shared handle to the in-memory database. Cloning is cheap; all clones
/// and the repositories created from them see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    db: Arc<RwLock<MemoryDb>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read(&self) -> Result<RwLockReadGuard<'_, MemoryDb>, StoreError> {
        self.db.read().map_err(|_| StoreError::Poisoned)
    }

    pub(super) fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryDb>, StoreError> {
        self.db.write().map_err(|_| StoreError::Poisoned)
    }

    fn verify_check(db: &MemoryDb, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::CheckItemVersion { item_id, expected } => {
                let current = db.items.get(item_id).map(|item| item.version);
                if current != Some(*expected) {
                    return Err(StoreError::Conflict);
                }
            }
            WriteOp::CheckTripUpdatedAt { trip_id, expected } => {
                let current = db.trips.get(trip_id).map(|trip| trip.updated_at);
                if current != Some(*expected) {
                    return Err(StoreError::Conflict);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply(db: &mut MemoryDb, op: WriteOp) {
        match op {
            WriteOp::PutTrip(trip) => {
                db.trips.insert(trip.id.clone(), trip);
            }
            WriteOp::PutItem(item) => {
                db.items.insert(item.id.clone(), item);
            }
            WriteOp::PutClaim(claim) => {
                db.claims.insert(claim.id.clone(), claim);
            }
            WriteOp::PutDebt(debt) => {
                db.debts.insert(debt.id.clone(), debt);
            }
            WriteOp::PutDelivery(delivery) => {
                db.deliveries.insert(delivery.id.clone(), delivery);
            }
            WriteOp::PutRequest(request) => {
                db.requests.insert(request.id.clone(), request);
            }
            WriteOp::CheckItemVersion { .. } | WriteOp::CheckTripUpdatedAt { .. } => {}
        }
    }
}

impl Connection for MemoryConnection {
    type TripRepository = MemoryTripRepository;
    type ItemRepository = MemoryItemRepository;
    type ClaimRepository = MemoryClaimRepository;
    type DebtRepository = MemoryDebtRepository;
    type DeliveryRepository = MemoryDeliveryRepository;
    type RequestRepository = MemoryRequestRepository;

    fn create_trip_repository(&self) -> Self::TripRepository {
        MemoryTripRepository::new(self.clone())
    }

    fn create_item_repository(&self) -> Self::ItemRepository {
        MemoryItemRepository::new(self.clone())
    }

    fn create_claim_repository(&self) -> Self::ClaimRepository {
        MemoryClaimRepository::new(self.clone())
    }

    fn create_debt_repository(&self) -> Self::DebtRepository {
        MemoryDebtRepository::new(self.clone())
    }

    fn create_delivery_repository(&self) -> Self::DeliveryRepository {
        MemoryDeliveryRepository::new(self.clone())
    }

    fn create_request_repository(&self) -> Self::RequestRepository {
        MemoryRequestRepository::new(self.clone())
    }

    fn atomic_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut db = self.write()?;
        for op in &ops {
            Self::verify_check(&db, op)?;
        }
        for op in ops {
            Self::apply(&mut db, op);
        }
        Ok(())
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        if ops
            .iter()
            .any(|op| matches!(op, WriteOp::CheckItemVersion { .. } | WriteOp::CheckTripUpdatedAt { .. }))
        {
            return Err(StoreError::Unsupported("precondition in batch write"));
        }
        let mut db = self.write()?;
        for op in ops {
            Self::apply(&mut db, op);
        }
        Ok(())
    }
}

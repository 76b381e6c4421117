use crate::domain::models::Claim;
use crate::storage::traits::{ClaimStorage, StoreError};

use super::connection::MemoryConnection;

/// In-memory claim repository. Claims are append-only at the collection
/// level; `update_claim` only ever rewrites status and completion fields.
#[derive(Debug, Clone)]
pub struct MemoryClaimRepository {
    connection: MemoryConnection,
}

impl MemoryClaimRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl ClaimStorage for MemoryClaimRepository {
    fn get_claim(&self, claim_id: &str) -> Result<Option<Claim>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.claims.get(claim_id).cloned())
    }

    fn update_claim(&self, claim: &Claim) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.claims.insert(claim.id.clone(), claim.clone());
        Ok(())
    }

    fn list_claims_for_item(&self, item_id: &str) -> Result<Vec<Claim>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .claims
            .values()
            .filter(|claim| claim.item_id == item_id)
            .cloned()
            .collect())
    }

    fn list_claims_for_trip(&self, trip_id: &str) -> Result<Vec<Claim>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .claims
            .values()
            .filter(|claim| claim.trip_id == trip_id)
            .cloned()
            .collect())
    }
}

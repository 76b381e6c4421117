use crate::domain::models::ItemRequest;
use crate::storage::traits::{ItemRequestStorage, StoreError};

use super::connection::MemoryConnection;

/// In-memory item request repository.
#[derive(Debug, Clone)]
pub struct MemoryRequestRepository {
    connection: MemoryConnection,
}

impl MemoryRequestRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl ItemRequestStorage for MemoryRequestRepository {
    fn store_request(&self, request: &ItemRequest) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    fn get_request(&self, request_id: &str) -> Result<Option<ItemRequest>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.requests.get(request_id).cloned())
    }

    fn list_requests_for_trip(&self, trip_id: &str) -> Result<Vec<ItemRequest>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .requests
            .values()
            .filter(|request| request.trip_id == trip_id)
            .cloned()
            .collect())
    }
}

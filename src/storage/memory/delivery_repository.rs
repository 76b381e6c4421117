use crate::domain::models::Delivery;
use crate::storage::traits::{DeliveryStorage, StoreError};

use super::connection::MemoryConnection;

/// In-memory delivery repository.
#[derive(Debug, Clone)]
pub struct MemoryDeliveryRepository {
    connection: MemoryConnection,
}

impl MemoryDeliveryRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl DeliveryStorage for MemoryDeliveryRepository {
    fn get_delivery(&self, delivery_id: &str) -> Result<Option<Delivery>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.deliveries.get(delivery_id).cloned())
    }

    fn update_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.deliveries.insert(delivery.id.clone(), delivery.clone());
        Ok(())
    }

    fn list_deliveries_for_trip(&self, trip_id: &str) -> Result<Vec<Delivery>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .deliveries
            .values()
            .filter(|delivery| delivery.trip_id == trip_id)
            .cloned()
            .collect())
    }
}

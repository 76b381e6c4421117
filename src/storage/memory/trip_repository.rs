use crate::domain::models::Trip;
use crate::storage::traits::{StoreError, TripStorage};

use super::connection::MemoryConnection;

/// In-memory trip repository.
#[derive(Debug, Clone)]
pub struct MemoryTripRepository {
    connection: MemoryConnection,
}

impl MemoryTripRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl TripStorage for MemoryTripRepository {
    fn store_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.trips.insert(trip.id.clone(), trip.clone());
        Ok(())
    }

    fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.trips.get(trip_id).cloned())
    }

    fn list_trips(&self) -> Result<Vec<Trip>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.trips.values().cloned().collect())
    }
}

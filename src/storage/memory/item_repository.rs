use crate::domain::models::Item;
use crate::storage::traits::{ItemStorage, StoreError};

use super::connection::MemoryConnection;

/// In-memory item repository.
#[derive(Debug, Clone)]
pub struct MemoryItemRepository {
    connection: MemoryConnection,
}

impl MemoryItemRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl ItemStorage for MemoryItemRepository {
    fn store_item(&self, item: &Item) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn get_item(&self, item_id: &str) -> Result<Option<Item>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.items.get(item_id).cloned())
    }

    fn list_items_for_trip(&self, trip_id: &str) -> Result<Vec<Item>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .items
            .values()
            .filter(|item| item.trip_id == trip_id)
            .cloned()
            .collect())
    }
}

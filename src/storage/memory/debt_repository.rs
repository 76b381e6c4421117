use crate::domain::models::DebtTransaction;
use crate::storage::traits::{DebtStorage, StoreError};

use super::connection::MemoryConnection;

/// In-memory debt transaction repository.
#[derive(Debug, Clone)]
pub struct MemoryDebtRepository {
    connection: MemoryConnection,
}

impl MemoryDebtRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

impl DebtStorage for MemoryDebtRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<Option<DebtTransaction>, StoreError> {
        let db = self.connection.read()?;
        Ok(db.debts.get(transaction_id).cloned())
    }

    fn update_transaction(&self, transaction: &DebtTransaction) -> Result<(), StoreError> {
        let mut db = self.connection.write()?;
        db.debts.insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    fn list_transactions_for_trip(&self, trip_id: &str) -> Result<Vec<DebtTransaction>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .debts
            .values()
            .filter(|debt| debt.trip_id == trip_id)
            .cloned()
            .collect())
    }

    fn list_transactions_for_user(&self, user_id: &str) -> Result<Vec<DebtTransaction>, StoreError> {
        let db = self.connection.read()?;
        Ok(db
            .debts
            .values()
            .filter(|debt| debt.from_user_id == user_id || debt.to_user_id == user_id)
            .cloned()
            .collect())
    }
}

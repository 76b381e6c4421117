//! Debt ledger service: settlement and derived balances.
//!
//! Debt transactions are created by the claim service, atomically with
//! their claims; this service only ever settles them and folds them into
//! per-user balances. Settlement is irreversible and never rewrites the
//! point amounts, preserving the audit trail.

use chrono::Utc;
use log::info;
use serde_json::json;
use std::sync::Arc;

use crate::domain::commands::transactions::{
    SettleTransactionCommand, SettleTransactionResult, UserBalanceQuery, UserBalanceResult,
};
use crate::domain::models::{DebtTransaction, TransactionStatus, UserBalance};
use crate::error::EngineError;
use crate::notification::{send_or_log, NotificationKind, NotificationSink};
use crate::storage::traits::{Connection, DebtStorage, TripStorage};

#[derive(Clone)]
pub struct TransactionService<C: Connection> {
    trip_repository: C::TripRepository,
    debt_repository: C::DebtRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl<C: Connection> TransactionService<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        let trip_repository = connection.create_trip_repository();
        let debt_repository = connection.create_debt_repository();
        Self {
            trip_repository,
            debt_repository,
            notifier,
        }
    }

    /// Mark a pending debt as settled. Only the creditor or a trip editor
    /// may settle; settling twice is a status-machine violation and leaves
    /// the original `settled_at` untouched.
    pub fn settle_transaction(
        &self,
        command: SettleTransactionCommand,
    ) -> Result<SettleTransactionResult, EngineError> {
        let mut transaction = self
            .debt_repository
            .get_transaction(&command.transaction_id)?
            .ok_or_else(|| EngineError::not_found("transaction", &command.transaction_id))?;
        let trip = self
            .trip_repository
            .get_trip(&transaction.trip_id)?
            .ok_or_else(|| EngineError::not_found("trip", &transaction.trip_id))?;

        if command.actor_id != transaction.to_user_id && !trip.is_editor(&command.actor_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not settle transaction {}",
                command.actor_id, transaction.id
            )));
        }
        if transaction.status == TransactionStatus::Settled {
            return Err(EngineError::invalid_transition(
                "transaction is already settled",
            ));
        }

        transaction.status = TransactionStatus::Settled;
        transaction.settled_at = Some(Utc::now());
        self.debt_repository.update_transaction(&transaction)?;

        info!(
            "transaction {} settled by {} ({} points)",
            transaction.id, command.actor_id, transaction.item_points
        );
        send_or_log(
            self.notifier.as_ref(),
            &transaction.from_user_id,
            NotificationKind::DebtSettled,
            json!({
                "trip_id": transaction.trip_id,
                "transaction_id": transaction.id,
                "item_points": transaction.item_points,
            }),
        );
        Ok(SettleTransactionResult { transaction })
    }

    /// Recompute a user's balance from their pending debts, optionally
    /// scoped to one trip. Derived on demand, never stored.
    pub fn user_balance(&self, query: UserBalanceQuery) -> Result<UserBalanceResult, EngineError> {
        let transactions = self.debt_repository.list_transactions_for_user(&query.user_id)?;
        let mut balance = UserBalance::new(query.user_id.clone());
        for transaction in transactions {
            if transaction.status != TransactionStatus::Pending {
                continue;
            }
            if let Some(trip_id) = &query.trip_id {
                if &transaction.trip_id != trip_id {
                    continue;
                }
            }
            if transaction.from_user_id == query.user_id {
                balance.total_items_owed += transaction.item_points;
            }
            if transaction.to_user_id == query.user_id {
                balance.total_items_owed_to += transaction.item_points;
            }
        }
        Ok(UserBalanceResult { balance })
    }

    pub fn list_transactions_for_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<DebtTransaction>, EngineError> {
        Ok(self.debt_repository.list_transactions_for_trip(trip_id)?)
    }

    pub fn list_transactions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<DebtTransaction>, EngineError> {
        Ok(self.debt_repository.list_transactions_for_user(user_id)?)
    }
}

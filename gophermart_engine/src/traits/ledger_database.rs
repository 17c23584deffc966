use gm_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, NewUser, NewWithdrawal, Order, OrderNumber, SettleOutcome, User, Withdrawal};

/// The persistence contract for the loyalty ledger.
///
/// The ledger exclusively owns all persisted state. It guarantees:
/// * at most one order row per number, across all users;
/// * user balances never go below zero in a committed transaction;
/// * a withdrawal row is only ever inserted together with the matching debit.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase {
    /// Inserts a new user with a zero balance. The password field carries the
    /// hash, never the plaintext.
    async fn user_add(&self, user: NewUser) -> Result<(), LedgerError>;

    /// Fetches a user by id. Absence is not an error at this layer.
    async fn user_get(&self, user_id: &str) -> Result<Option<User>, LedgerError>;

    /// Inserts an order with status `NEW`, zero accrual and the current
    /// timestamp. A duplicate number yields [`LedgerError::OrderAlreadyExists`];
    /// the unique index is the source of truth for cross-user conflicts.
    async fn order_add(&self, user_id: &str, number: &OrderNumber) -> Result<Order, LedgerError>;

    /// Fetches an order by number.
    async fn order_get(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;

    /// All orders uploaded by the user, ascending by upload time.
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, LedgerError>;

    /// Atomically moves every `NEW` or `PROCESSING` order to `PROCESSING` and
    /// returns the affected rows. A single statement, so two dispatchers
    /// cannot claim the same row twice, and orders stranded in `PROCESSING`
    /// by a crash are re-claimed on the next call.
    async fn claim_unprocessed(&self) -> Result<Vec<Order>, LedgerError>;

    /// Sets status and accrual for the order's number. Last writer wins; used
    /// by the settlement transaction, not directly by workers.
    async fn update_order(&self, order: &Order) -> Result<(), LedgerError>;

    /// Credits the order's accrual to its owner's balance. Only called for
    /// positive awards.
    async fn credit_accrual(&self, order: &Order) -> Result<(), LedgerError>;

    /// Applies an accrual verdict in one transaction: the status update is
    /// guarded on the row still being `PROCESSING`, and the owner is credited
    /// in the same transaction when the award is positive. A lost guard means
    /// another worker settled first and nothing is changed, so a duplicated
    /// verdict can never credit a balance twice.
    async fn settle_order(&self, order: &Order) -> Result<SettleOutcome, LedgerError>;

    /// Debits the user's balance and records the withdrawal in one
    /// transaction. The debit carries a `accrual >= sum` guard; if it matches
    /// no row the transaction is rolled back and
    /// [`LedgerError::InsufficientFunds`] is returned, so concurrent
    /// withdrawals cannot drive a balance negative.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    /// All withdrawals by the user, ascending by processing time.
    async fn withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Reads the user's current balance and lifetime withdrawn total in a
    /// single transaction.
    async fn balance_for_user(&self, user_id: &str) -> Result<Balance, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("internal database error: {0}")]
    Database(String),
    #[error("user {0} is already registered")]
    UserAlreadyExists(String),
    #[error("order {0} has already been uploaded")]
    OrderAlreadyExists(OrderNumber),
    #[error("a withdrawal against order {0} has already been recorded")]
    WithdrawalAlreadyExists(OrderNumber),
    #[error("user {0} does not exist")]
    UserNotFound(String),
    #[error("insufficient accrual balance to withdraw {0}")]
    InsufficientFunds(Points),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for LedgerError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        LedgerError::Database(e.to_string())
    }
}

//! `SqliteDatabase` is the persistent implementation of the loyalty ledger.
//!
//! It holds a connection pool and implements [`LedgerDatabase`] by delegating
//! to the low-level query functions in the [`db`](super::db) module, opening
//! transactions where the contract demands atomicity.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{self, orders, users, withdrawals};
use crate::{
    db_types::{Balance, NewUser, NewWithdrawal, Order, OrderNumber, SettleOutcome, User, Withdrawal},
    traits::{LedgerDatabase, LedgerError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url` (creating the file if necessary) and
    /// applies any pending schema migrations. A fully migrated database is
    /// not an error.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let pool = db::new_pool(url, max_connections).await?;
        sqlx::migrate!("./src/sqlite/migrations").run(&pool).await?;
        debug!("🗃️ Migrations complete for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    /// The URL of the database.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LedgerDatabase for SqliteDatabase {
    async fn user_add(&self, user: NewUser) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn user_get(&self, user_id: &str) -> Result<Option<User>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn order_add(&self, user_id: &str, number: &OrderNumber) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(user_id, number, &mut conn).await
    }

    async fn order_get(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(number, &mut conn).await
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn claim_unprocessed(&self) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::claim_unprocessed(&mut conn).await
    }

    async fn update_order(&self, order: &Order) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order(order, &mut conn).await
    }

    async fn credit_accrual(&self, order: &Order) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::credit_balance(&order.user_id, order.accrual, &mut conn).await
    }

    async fn settle_order(&self, order: &Order) -> Result<SettleOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let applied = orders::apply_settlement(order, &mut tx).await?;
        if !applied {
            tx.rollback().await?;
            debug!("🗃️ Order {} was already settled; nothing to apply", order.number);
            return Ok(SettleOutcome::AlreadySettled);
        }
        if order.accrual.is_positive() {
            users::credit_balance(&order.user_id, order.accrual, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} settled as {} with {} points", order.number, order.status, order.accrual);
        Ok(SettleOutcome::Applied)
    }

    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let debited = users::debit_balance(&withdrawal.user_id, withdrawal.sum, &mut tx).await?;
        if !debited {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientFunds(withdrawal.sum));
        }
        let recorded = withdrawals::insert_withdrawal(&withdrawal, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ {} withdrew {} against order {}", withdrawal.user_id, withdrawal.sum, withdrawal.number);
        Ok(recorded)
    }

    async fn withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await
    }

    async fn balance_for_user(&self, user_id: &str) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let user =
            users::fetch_user(user_id, &mut tx).await?.ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;
        let withdrawn = withdrawals::total_withdrawn(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Balance { current: user.accrual, withdrawn })
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

use std::fmt::Debug;

use log::*;

use crate::{
    api::OrderApiError,
    db_types::{Order, OrderNumber, SettleOutcome},
    traits::{LedgerDatabase, LedgerError},
};

/// Outcome of submitting an order number for a user.
#[derive(Debug, Clone)]
pub enum OrderSubmission {
    /// The order was enrolled with status `NEW`.
    Accepted(Order),
    /// The caller already uploaded this number; re-submission is a no-op.
    AlreadyUploaded,
}

/// Order-facing service API: admission, history, and the claim/settle cycle
/// driven by the accrual workers.
#[derive(Clone)]
pub struct OrdersApi<B> {
    db: B,
}

impl<B> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi")
    }
}

impl<B> OrdersApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrdersApi<B>
where B: LedgerDatabase
{
    /// Admits an order for the user.
    ///
    /// The pre-read only exists to tell a same-user re-submission apart from
    /// a cross-user conflict; the unique index on `number` is the source of
    /// truth, so an insert that loses a race is reported as a cross-user
    /// conflict too.
    pub async fn submit(&self, user_id: &str, number: OrderNumber) -> Result<OrderSubmission, OrderApiError> {
        if let Some(existing) = self.db.order_get(&number).await? {
            if existing.user_id == user_id {
                debug!("📦️ Order {number} was already uploaded by {user_id}");
                return Ok(OrderSubmission::AlreadyUploaded);
            }
            debug!("📦️ Order {number} is already registered to another user");
            return Err(OrderApiError::OwnedByOtherUser(number));
        }
        match self.db.order_add(user_id, &number).await {
            Ok(order) => {
                info!("📦️ Order {} enrolled for user {user_id}", order.number);
                Ok(OrderSubmission::Accepted(order))
            },
            Err(LedgerError::OrderAlreadyExists(n)) => Err(OrderApiError::OwnedByOtherUser(n)),
            Err(e) => Err(e.into()),
        }
    }

    /// The user's upload history, ascending by upload time.
    pub async fn history(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError> {
        let orders = self.db.orders_for_user(user_id).await?;
        Ok(orders)
    }

    /// Claims every unprocessed order for the accrual dispatcher.
    pub async fn claim_unprocessed(&self) -> Result<Vec<Order>, OrderApiError> {
        let orders = self.db.claim_unprocessed().await?;
        Ok(orders)
    }

    /// Applies an accrual verdict through the ledger's guarded settlement
    /// transaction.
    pub async fn settle(&self, order: &Order) -> Result<SettleOutcome, OrderApiError> {
        let outcome = self.db.settle_order(order).await?;
        Ok(outcome)
    }
}

use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderNumber, OrderStatus},
    sqlite::db::is_unique_violation,
    traits::LedgerError,
};

/// Inserts a new order with status `NEW` and zero accrual. The primary key on
/// `number` rejects duplicates across all users.
pub async fn insert_order(
    user_id: &str,
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (number, userid, status, accrual, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(number)
    .bind(user_id)
    .bind(OrderStatus::New)
    .bind(0i64)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order {number} inserted for user {user_id}");
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => Err(LedgerError::OrderAlreadyExists(number.clone())),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, LedgerError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders for the user, ordered by `uploaded_at` in ascending order.
pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE userid = $1 ORDER BY uploaded_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// The claim primitive: one statement that moves every `NEW` or `PROCESSING`
/// order to `PROCESSING` and returns the affected rows. Re-claiming
/// `PROCESSING` rows is what makes the poller restart-safe.
pub async fn claim_unprocessed(conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let orders = sqlx::query_as("UPDATE orders SET status = $1 WHERE status IN ($2, $3) RETURNING *")
        .bind(OrderStatus::Processing)
        .bind(OrderStatus::New)
        .bind(OrderStatus::Processing)
        .fetch_all(conn)
        .await?;
    trace!("📝️ Claimed {} unprocessed orders", orders.len());
    Ok(orders)
}

/// Unconditionally sets status and accrual for the order's number.
pub async fn update_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query("UPDATE orders SET status = $1, accrual = $2 WHERE number = $3")
        .bind(order.status)
        .bind(order.accrual)
        .bind(&order.number)
        .execute(conn)
        .await?;
    Ok(())
}

/// Guarded settlement update: only a row still in `PROCESSING` is touched.
/// Returns whether the guard matched.
pub async fn apply_settlement(order: &Order, conn: &mut SqliteConnection) -> Result<bool, LedgerError> {
    let result = sqlx::query("UPDATE orders SET status = $1, accrual = $2 WHERE number = $3 AND status = $4")
        .bind(order.status)
        .bind(order.accrual)
        .bind(&order.number)
        .bind(OrderStatus::Processing)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

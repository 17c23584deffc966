use chrono::Utc;
use gm_common::Points;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    sqlite::db::is_unique_violation,
    traits::LedgerError,
};

/// Records a withdrawal. The unique index on `number` rejects a second
/// withdrawal against the same order.
pub async fn insert_withdrawal(w: &NewWithdrawal, conn: &mut SqliteConnection) -> Result<Withdrawal, LedgerError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (userid, number, sum, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(&w.user_id)
    .bind(&w.number)
    .bind(w.sum)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(withdrawal) => {
            debug!("📝️ Withdrawal of {} against order {} recorded for {}", w.sum, w.number, w.user_id);
            Ok(withdrawal)
        },
        Err(e) if is_unique_violation(&e) => Err(LedgerError::WithdrawalAlreadyExists(w.number.clone())),
        Err(e) => Err(e.into()),
    }
}

/// All withdrawals for the user, ordered by `processed_at` in ascending order.
pub async fn fetch_withdrawals_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE userid = $1 ORDER BY processed_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}

/// Lifetime total withdrawn by the user.
pub async fn total_withdrawn(user_id: &str, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(sum), 0) FROM withdrawals WHERE userid = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(Points::from_minor_units(total))
}

use gm_common::Points;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    sqlite::db::is_unique_violation,
    traits::LedgerError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let result = sqlx::query("INSERT INTO users (userid, password, accrual) VALUES ($1, $2, $3)")
        .bind(&user.user_id)
        .bind(&user.password)
        .bind(Points::default())
        .execute(conn)
        .await;
    match result {
        Ok(_) => {
            debug!("🧑️ User {} inserted", user.user_id);
            Ok(())
        },
        Err(e) if is_unique_violation(&e) => Err(LedgerError::UserAlreadyExists(user.user_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, LedgerError> {
    let user = sqlx::query_as("SELECT userid, password, accrual FROM users WHERE userid = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Credits `amount` to the user's balance.
pub async fn credit_balance(user_id: &str, amount: Points, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query("UPDATE users SET accrual = accrual + $1 WHERE userid = $2")
        .bind(amount)
        .bind(user_id)
        .execute(conn)
        .await?;
    debug!("🧑️ Credited {amount} points to {user_id}");
    Ok(())
}

/// Debits `amount` from the user's balance, guarded so the balance can never
/// go negative. Returns `false` (and changes nothing) if the user does not
/// exist or holds less than `amount`.
pub async fn debit_balance(user_id: &str, amount: Points, conn: &mut SqliteConnection) -> Result<bool, LedgerError> {
    let result = sqlx::query("UPDATE users SET accrual = accrual - $1 WHERE userid = $2 AND accrual >= $1")
        .bind(amount)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

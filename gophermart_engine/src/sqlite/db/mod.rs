//! # SQLite query functions
//!
//! "Low-level" database interactions, one module per table. Everything is a
//! simple function over `&mut SqliteConnection` rather than a stateful
//! struct, so callers can run a query on a pooled connection or compose
//! several inside a transaction by passing `&mut *tx`.
use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod orders;
pub mod users;
pub mod withdrawals;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}

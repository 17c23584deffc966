//! Helpers for driving the engine in tests.

use crate::SqliteDatabase;

/// A fresh, fully migrated, purely in-memory ledger.
///
/// The pool is capped at a single connection: each `sqlite::memory:`
/// connection is its own database, so a larger pool would hand out empty
/// schemas.
pub async fn memory_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database")
}

//! # Gophermart engine
//!
//! The engine owns everything below the HTTP surface of the loyalty service:
//! the persisted data types, order-number validation, the [`traits::LedgerDatabase`]
//! contract that storage backends implement, the SQLite backend, and the
//! service APIs ([`AccountApi`], [`OrdersApi`]) that the server and the
//! accrual workers drive.

mod api;
pub mod db_types;
pub mod helpers;
mod sqlite;
pub mod test_utils;
pub mod traits;

pub use api::{AccountApi, AccountApiError, OrderApiError, OrderSubmission, OrdersApi};
pub use sqlite::SqliteDatabase;

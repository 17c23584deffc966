//! # Ledger contracts
//!
//! This module defines the behaviour a storage backend must expose to support
//! the Gophermart engine.
//!
//! [`LedgerDatabase`] is the complete capability set: user registration and
//! lookup, order admission and claiming, accrual settlement, and the
//! double-entry withdrawal flow. The service APIs in [`crate::api`] are
//! generic over it, so the HTTP layer can run against the SQLite backend in
//! production and against mocks in endpoint tests.

mod ledger_database;

pub use ledger_database::{LedgerDatabase, LedgerError};

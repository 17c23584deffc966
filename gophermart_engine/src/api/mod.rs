//! Service APIs layered over a [`crate::traits::LedgerDatabase`] backend.
//!
//! [`AccountApi`] covers registration, credential checks, balances and
//! withdrawals; [`OrdersApi`] covers order admission and the accrual
//! pipeline's claim/settle cycle. Both are thin and generic over the backend
//! so that endpoint tests can drive them with mocks.

mod account_api;
mod errors;
mod orders_api;

pub use account_api::AccountApi;
pub use errors::{AccountApiError, OrderApiError};
pub use orders_api::{OrderSubmission, OrdersApi};

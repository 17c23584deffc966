use thiserror::Error;

use crate::{db_types::OrderNumber, traits::LedgerError};

#[derive(Debug, Error)]
pub enum AccountApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("withdrawal amount must be positive")]
    NonPositiveAmount,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

#[derive(Debug, Error)]
pub enum OrderApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("order {0} has already been uploaded by another user")]
    OwnedByOtherUser(OrderNumber),
}

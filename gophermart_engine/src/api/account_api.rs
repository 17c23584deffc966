use std::fmt::Debug;

use gm_common::Points;
use log::*;

use crate::{
    api::AccountApiError,
    db_types::{Balance, NewUser, NewWithdrawal, OrderNumber, User, Withdrawal},
    traits::{LedgerDatabase, LedgerError},
};

/// Account-facing service API: registration, credential verification,
/// balances and withdrawals.
#[derive(Clone)]
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: LedgerDatabase
{
    /// Registers a new user. The password is bcrypt-hashed before it reaches
    /// the ledger; a duplicate login surfaces as
    /// [`LedgerError::UserAlreadyExists`].
    pub async fn register(&self, user_id: &str, password: &str) -> Result<(), AccountApiError> {
        let hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AccountApiError::PasswordHash(e.to_string()))?;
        self.db.user_add(NewUser { user_id: user_id.to_string(), password: hash }).await?;
        debug!("🧑️ User {user_id} has been registered");
        Ok(())
    }

    /// Checks a login/password pair. An unknown login and a wrong password
    /// are indistinguishable to the caller.
    pub async fn verify_credentials(&self, user_id: &str, password: &str) -> Result<User, AccountApiError> {
        let user = self.db.user_get(user_id).await?.ok_or(AccountApiError::InvalidCredentials)?;
        let valid = bcrypt::verify(password, &user.password).map_err(|e| AccountApiError::PasswordHash(e.to_string()))?;
        if !valid {
            debug!("🧑️ Incorrect password for user {user_id}");
            return Err(AccountApiError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn balance(&self, user_id: &str) -> Result<Balance, AccountApiError> {
        let balance = self.db.balance_for_user(user_id).await?;
        Ok(balance)
    }

    /// Withdraws `sum` points against a fresh order number.
    ///
    /// The pre-read gives concurrent callers a fast rejection; the ledger's
    /// guarded debit is what actually keeps the balance non-negative when two
    /// withdrawals race.
    pub async fn withdraw(
        &self,
        user_id: &str,
        number: OrderNumber,
        sum: Points,
    ) -> Result<Withdrawal, AccountApiError> {
        if !sum.is_positive() {
            return Err(AccountApiError::NonPositiveAmount);
        }
        let user =
            self.db.user_get(user_id).await?.ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;
        if user.accrual.is_zero() || sum > user.accrual {
            debug!("🧑️ {user_id} asked to withdraw {sum} but holds only {}", user.accrual);
            return Err(LedgerError::InsufficientFunds(sum).into());
        }
        let withdrawal = self.db.withdraw(NewWithdrawal { user_id: user_id.to_string(), number, sum }).await?;
        Ok(withdrawal)
    }

    pub async fn withdrawals(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError> {
        let withdrawals = self.db.withdrawals_for_user(user_id).await?;
        Ok(withdrawals)
    }
}

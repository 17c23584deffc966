use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gm_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn;

//--------------------------------------    OrderNumber    -----------------------------------------------------------

/// A syntactically valid order number.
///
/// The only way to construct one is through [`OrderNumber::parse`], which
/// requires a decimal integer that passes the Luhn check. Anything else is an
/// [`InvalidOrderNumber`], which callers surface as an unprocessable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, Error)]
#[error("invalid order number: {0}")]
pub struct InvalidOrderNumber(String);

impl OrderNumber {
    pub fn parse<S: AsRef<str>>(raw: S) -> Result<Self, InvalidOrderNumber> {
        let raw = raw.as_ref().trim();
        let number = raw.parse::<i64>().map_err(|_| InvalidOrderNumber(raw.to_string()))?;
        if number < 0 || !luhn::is_valid(number) {
            return Err(InvalidOrderNumber(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    OrderStatus    -----------------------------------------------------------

/// Lifecycle of an order in the accrual pipeline.
///
/// `Invalid` and `Processed` are terminal. `Processing -> Processing` is a
/// legal no-op so that a claim can be re-issued after a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Uploaded, not yet picked up by the accrual dispatcher.
    New,
    /// Claimed by the dispatcher; a worker is (or will be) querying the accrual service.
    Processing,
    /// The accrual service rejected the order. Terminal.
    Invalid,
    /// Scored by the accrual service and settled. Terminal.
    Processed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Invalid => write!(f, "INVALID"),
            OrderStatus::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("invalid order status: {0}")]
pub struct InvalidOrderStatus(String);

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}

//--------------------------------------       User       ------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct User {
    #[sqlx(rename = "userid")]
    pub user_id: String,
    /// bcrypt hash of the user's password.
    pub password: String,
    pub accrual: Points,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    /// Already hashed; the ledger never sees a plaintext password.
    pub password: String,
}

//--------------------------------------       Order      ------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub number: OrderNumber,
    #[sqlx(rename = "userid")]
    #[serde(skip)]
    pub user_id: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Points::is_zero")]
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
}

//--------------------------------------    Withdrawal    ------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Withdrawal {
    #[sqlx(rename = "userid")]
    #[serde(skip)]
    pub user_id: String,
    #[serde(rename = "order")]
    pub number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: String,
    pub number: OrderNumber,
    pub sum: Points,
}

//--------------------------------------      Balance     ------------------------------------------------------------

/// A user's balance as returned to clients: current spendable points and the
/// lifetime total withdrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------   SettleOutcome  ------------------------------------------------------------

/// Result of applying an accrual verdict to a claimed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The order was still `PROCESSING`; status, accrual and (for positive
    /// awards) the owner's balance were updated.
    Applied,
    /// Another worker settled the order first; nothing was changed.
    AlreadySettled,
}

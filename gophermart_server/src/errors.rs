use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use gophermart_engine::{traits::LedgerError, AccountApiError, OrderApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Insufficient accrual balance")]
    PaymentRequired,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable request: {0}")]
    UnprocessableEntity(String),
    #[error("Invalid server configuration: {0}")]
    ConfigurationError(String),
    #[error("Failed to initialize the server: {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).insert_header(ContentType::plaintext()).body(self.to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserAlreadyExists(_)
            | LedgerError::OrderAlreadyExists(_)
            | LedgerError::WithdrawalAlreadyExists(_) => ServerError::Conflict(e.to_string()),
            LedgerError::InsufficientFunds(_) => ServerError::PaymentRequired,
            // A valid token naming an unknown user means the credentials are no longer good.
            LedgerError::UserNotFound(_) => ServerError::Unauthorized(e.to_string()),
            LedgerError::Database(_) => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::Ledger(inner) => inner.into(),
            AccountApiError::InvalidCredentials => ServerError::Unauthorized(e.to_string()),
            AccountApiError::NonPositiveAmount => ServerError::UnprocessableEntity(e.to_string()),
            AccountApiError::PasswordHash(_) => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::Ledger(inner) => inner.into(),
            OrderApiError::OwnedByOtherUser(_) => ServerError::Conflict(e.to_string()),
        }
    }
}

//! Request handler definitions.
//!
//! Handlers are generic over the ledger backend so endpoint tests can mount
//! them against mocks; the production server instantiates them with
//! [`gophermart_engine::SqliteDatabase`]. Anything longer than a screen
//! belongs in its own module.

use actix_web::{get, http::header, web, HttpResponse, Responder};
use gophermart_engine::{
    db_types::OrderNumber,
    traits::LedgerDatabase,
    AccountApi,
    OrderSubmission,
    OrdersApi,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    data_objects::{Credentials, WithdrawRequest},
    errors::ServerError,
    middleware::AuthenticatedUser,
};

// ----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Auth   -----------------------------------------------------

/// `POST /api/user/register`. Registers the user, then logs them in; success
/// is 200 with the access token in the `Authorization` header.
pub async fn register<B: LedgerDatabase>(
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    api.register(&login, &password).await.map_err(|e| {
        debug!("💻️ Could not register user {login}. {e}");
        ServerError::from(e)
    })?;
    // A failed follow-up login surfaces as its own 401 rather than undoing the registration.
    let user = api.verify_credentials(&login, &password).await?;
    let token = signer.issue_token(&user.user_id)?;
    info!("💻️ User {login} registered");
    Ok(HttpResponse::Ok().insert_header((header::AUTHORIZATION, format!("Bearer {token}"))).finish())
}

/// `POST /api/user/login`.
pub async fn login<B: LedgerDatabase>(
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    let user = api.verify_credentials(&login, &password).await.map_err(|e| {
        debug!("💻️ Login failed for {login}. {e}");
        ServerError::from(e)
    })?;
    let token = signer.issue_token(&user.user_id)?;
    debug!("💻️ User {login} logged in");
    Ok(HttpResponse::Ok().insert_header((header::AUTHORIZATION, format!("Bearer {token}"))).finish())
}

// ----------------------------------------------   Orders  ----------------------------------------------------

/// `POST /api/user/orders`. The body is the raw order number; 202 for a new
/// enrolment, 200 for a same-user re-submission.
pub async fn submit_order<B: LedgerDatabase>(
    user: AuthenticatedUser,
    api: web::Data<OrdersApi<B>>,
    body: web::Bytes,
) -> Result<HttpResponse, ServerError> {
    let raw = String::from_utf8(body.to_vec())
        .map_err(|_| ServerError::UnprocessableEntity("order number is not valid text".to_string()))?;
    let number = OrderNumber::parse(&raw).map_err(|e| {
        debug!("💻️ Rejecting order upload from {}: {e}", user.0);
        ServerError::UnprocessableEntity(e.to_string())
    })?;
    match api.submit(&user.0, number).await? {
        OrderSubmission::Accepted(order) => {
            info!("💻️ Order {} accepted for user {}", order.number, user.0);
            Ok(HttpResponse::Accepted().finish())
        },
        OrderSubmission::AlreadyUploaded => Ok(HttpResponse::Ok().finish()),
    }
}

/// `GET /api/user/orders`. Upload history, oldest first; an empty history is
/// an empty JSON array.
pub async fn order_history<B: LedgerDatabase>(
    user: AuthenticatedUser,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.history(&user.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}

// ----------------------------------------------   Balance  ---------------------------------------------------

/// `GET /api/user/balance`.
pub async fn balance<B: LedgerDatabase>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let balance = api.balance(&user.0).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// `POST /api/user/balance/withdraw`.
pub async fn withdraw<B: LedgerDatabase>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
    body: web::Json<WithdrawRequest>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawRequest { order, sum } = body.into_inner();
    let number = OrderNumber::parse(&order).map_err(|e| {
        debug!("💻️ Rejecting withdrawal from {}: {e}", user.0);
        ServerError::UnprocessableEntity(e.to_string())
    })?;
    api.withdraw(&user.0, number, sum).await?;
    info!("💻️ User {} withdrew {sum} against order {order}", user.0);
    Ok(HttpResponse::Ok().finish())
}

/// `GET /api/user/withdrawals`. Oldest first; empty history is an empty array.
pub async fn withdrawals<B: LedgerDatabase>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let withdrawals = api.withdrawals(&user.0).await?;
    Ok(HttpResponse::Ok().json(withdrawals))
}

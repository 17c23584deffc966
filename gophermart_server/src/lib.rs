//! # Gophermart server
//!
//! The HTTP front-end and accrual pipeline of the loyalty service.
//!
//! ## Authentication
//!
//! Users register or log in with a login/password pair and receive an HS256
//! JWT in the `Authorization: Bearer <token>` response header. Every other
//! `/api/user/*` route sits behind [`middleware::AuthMiddlewareFactory`],
//! which validates the bearer token and injects the authenticated user id
//! into the request; handlers receive it through the
//! [`middleware::AuthenticatedUser`] extractor.
//!
//! ## Accrual pipeline
//!
//! Alongside the HTTP server, [`accrual`] runs a dispatcher that periodically
//! claims unprocessed orders from the ledger and a pool of workers that query
//! the external accrual service and settle the results, honouring the
//! service's rate limits through a shared deadline gate.

pub mod accrual;
pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;

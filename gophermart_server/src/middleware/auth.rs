//! Bearer-token authentication middleware.
//!
//! Validates the `Authorization: Bearer <jwt>` header on every request it
//! wraps and stores the authenticated user id in the request extensions.
//! Handlers receive it through the [`AuthenticatedUser`] extractor. Requests
//! without a valid token are rejected with 401 before any handler runs.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use futures::{
    future::{ok, ready, Ready},
    Future,
};
use gm_common::Secret;
use log::debug;

use crate::{auth::validate_token, errors::ServerError};

/// The user id extracted from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Unauthorized("no authenticated user on the request".to_string()));
        ready(user)
    }
}

pub struct AuthMiddlewareFactory {
    jwt_secret: Secret<String>,
}

impl AuthMiddlewareFactory {
    pub fn new(jwt_secret: Secret<String>) -> Self {
        Self { jwt_secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService { jwt_secret: self.jwt_secret.clone(), service: Rc::new(service) })
    }
}

pub struct AuthMiddlewareService<S> {
    jwt_secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let jwt_secret = self.jwt_secret.clone();
        Box::pin(async move {
            let header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ServerError::Unauthorized("missing Authorization header".to_string()))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ServerError::Unauthorized("Authorization header is not a bearer token".to_string()))?;
            let claims = validate_token(token, &jwt_secret)?;
            debug!("🔑️ Authenticated request for user {}", claims.sub);
            req.extensions_mut().insert(AuthenticatedUser(claims.sub));
            service.call(req).await
        })
    }
}

mod auth;

pub use auth::{AuthMiddlewareFactory, AuthMiddlewareService, AuthenticatedUser};

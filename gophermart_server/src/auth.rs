use chrono::Utc;
use gm_common::Secret;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::ServerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The authenticated user id.
    pub sub: String,
    /// Expiry as unix seconds.
    pub exp: i64,
}

/// Issues HS256 access tokens for authenticated users.
pub struct TokenIssuer {
    jwt_secret: Secret<String>,
    token_ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let token_ttl = chrono::Duration::seconds(config.token_ttl.as_secs() as i64);
        Self { jwt_secret: config.jwt_secret.clone(), token_ttl }
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String, ServerError> {
        let claims = JwtClaims { sub: user_id.to_string(), exp: (Utc::now() + self.token_ttl).timestamp() };
        let key = EncodingKey::from_secret(self.jwt_secret.reveal().as_bytes());
        let token = encode(&Header::default(), &claims, &key)
            .map_err(|e| ServerError::Internal(format!("failed to sign access token: {e}")))?;
        Ok(token)
    }
}

/// Validates an access token and returns its claims.
pub fn validate_token(token: &str, jwt_secret: &Secret<String>) -> Result<JwtClaims, ServerError> {
    let key = DecodingKey::from_secret(jwt_secret.reveal().as_bytes());
    let data = decode::<JwtClaims>(token, &key, &Validation::default()).map_err(|e| {
        debug!("🔑️ Token validation failed: {e}");
        ServerError::Unauthorized("invalid or expired access token".to_string())
    })?;
    Ok(data.claims)
}

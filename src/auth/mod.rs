pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::types::Role;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Authentication required")]
    Missing,

    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("JWT generation error: {0}")]
    Encoding(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// The caller a request was resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

/// HS256 token issuing and verification with the server secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: u64,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Self {
        let secret = security.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_hours: security.jwt_expiry_hours,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str, role: Role, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            exp: (now + Duration::hours(self.expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn service() -> TokenService {
        TokenService::new(&AppConfig::development().security)
    }

    #[test]
    fn issued_tokens_verify() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "a@example.com", Role::Landlord, Utc::now()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Landlord);
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let tokens = service();
        let old = Utc::now() - Duration::days(30);
        let token = tokens.issue(Uuid::new_v4(), "a@example.com", Role::User, old).unwrap();
        assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::Expired);

        let mut other = AppConfig::development().security;
        other.jwt_secret = "another-secret".to_string();
        let foreign = TokenService::new(&other)
            .issue(Uuid::new_v4(), "a@example.com", Role::User, Utc::now())
            .unwrap();
        assert_eq!(tokens.verify(&foreign).unwrap_err(), AuthError::Invalid);
        assert_eq!(tokens.verify("not-a-jwt").unwrap_err(), AuthError::Invalid);
    }
}

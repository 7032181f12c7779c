//! Stateless bearer tokens: `header.payload.signature`, HS256 over a server secret.
//!
//! Tokens cannot be revoked; logout is the client discarding its copy.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
};

pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> AppResult<String> {
        self.issue_at(user_id, email, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, email: &str, issued_at: DateTime<Utc>) -> AppResult<String> {
        let expires_at = issued_at
            .checked_add_signed(Duration::days(TOKEN_TTL_DAYS))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Checks signature and expiry, returning the token's user id and email.
    pub fn verify(&self, token: &str) -> AppResult<(Uuid, String)> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.user_id)
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

        Ok((user_id, decoded.claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let tokens = TokenService::new(b"unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "owner@example.com").unwrap();

        assert_eq!(token.split('.').count(), 3);
        let (id, email) = tokens.verify(&token).unwrap();
        assert_eq!(id, user_id);
        assert_eq!(email, "owner@example.com");
    }

    #[test]
    fn token_past_thirty_days_is_rejected() {
        let tokens = TokenService::new(b"unit-test-secret");
        let issued = Utc::now() - Duration::days(TOKEN_TTL_DAYS) - Duration::minutes(1);
        let token = tokens
            .issue_at(Uuid::new_v4(), "owner@example.com", issued)
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn token_inside_window_is_accepted() {
        let tokens = TokenService::new(b"unit-test-secret");
        let issued = Utc::now() - Duration::days(TOKEN_TTL_DAYS - 1);
        let token = tokens
            .issue_at(Uuid::new_v4(), "owner@example.com", issued)
            .unwrap();

        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = TokenService::new(b"unit-test-secret");
        let token = tokens.issue(Uuid::new_v4(), "a@example.com").unwrap();
        let other = tokens.issue(Uuid::new_v4(), "b@example.com").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        parts[1] = other_parts[1];
        let forged = parts.join(".");

        assert!(tokens.verify(&forged).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new(b"secret-one");
        let verifier = TokenService::new(b"secret-two");
        let token = issuer.issue(Uuid::new_v4(), "a@example.com").unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenService::new(b"unit-test-secret");
        assert!(tokens.verify("not-a-token").is_err());
        assert!(tokens.verify("").is_err());
    }
}

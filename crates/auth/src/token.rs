//! JWT issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, Result};

/// Claims carried by a CityFlow API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issues and validates HS256 tokens over a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl TokenService {
    /// Create a service signing with `secret`, issuing tokens valid for
    /// `expiry_hours`.
    pub fn new(secret: &[u8], expiry_hours: i64) -> Self {
        // Restricting the algorithm list to HS256 rejects tokens whose
        // header names any other family before signature checking.
        let validation = Validation::new(Algorithm::HS256);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry: Duration::hours(expiry_hours),
        }
    }

    /// Sign a token for a user.
    pub fn issue(&self, user_id: Uuid, email: &str, role: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            email: email.to_string(),
            role: role.to_string(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Encode)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-0123456789abcdef0123";

    fn service() -> TokenService {
        TokenService::new(SECRET, 24)
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let svc = service();
        let user_id = Uuid::new_v4();

        let token = svc.issue(user_id, "rider@example.com", "user").unwrap();
        let claims = svc.validate(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "rider@example.com");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue(Uuid::new_v4(), "a@b.c", "user").unwrap();
        let other = TokenService::new(b"a-completely-different-secret!!!", 24);
        assert!(matches!(other.validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative expiry puts `exp` in the past.
        let svc = TokenService::new(SECRET, -1);
        let token = svc.issue(Uuid::new_v4(), "a@b.c", "user").unwrap();
        assert!(matches!(
            service().validate(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let svc = service();
        let token = svc.issue(Uuid::new_v4(), "a@b.c", "user").unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(svc.validate(&tampered).is_err());
        assert!(svc.validate("garbage.token.here").is_err());
    }
}

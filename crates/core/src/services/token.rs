//! JWT issuing and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use quill_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Token kind: "access" or "refresh".
    pub kind: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Access and refresh tokens issued together at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

const ACCESS_KIND: &str = "access";
const REFRESH_KIND: &str = "refresh";

/// Token service for JWT auth.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Create a new token service.
    #[must_use]
    pub const fn new(secret: String, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue an access/refresh token pair for a user.
    pub fn issue_pair(&self, user_id: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user_id, ACCESS_KIND, self.access_ttl_secs)?,
            refresh_token: self.issue(user_id, REFRESH_KIND, self.refresh_ttl_secs)?,
        })
    }

    fn issue(&self, user_id: &str, kind: &str, ttl_secs: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            kind: kind.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify an access token and return the user ID.
    pub fn verify_access(&self, token: &str) -> AppResult<String> {
        let claims = self.verify(token)?;
        if claims.kind != ACCESS_KIND {
            return Err(AppError::Unauthorized);
        }
        Ok(claims.sub)
    }

    /// Verify a refresh token and issue a fresh pair.
    pub fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.verify(refresh_token)?;
        if claims.kind != REFRESH_KIND {
            return Err(AppError::Unauthorized);
        }
        self.issue_pair(&claims.sub)
    }

    fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret".to_string(), 900, 1_209_600)
    }

    #[test]
    fn test_issue_and_verify_access() {
        let svc = service();
        let pair = svc.issue_pair("u1").unwrap();

        assert_eq!(svc.verify_access(&pair.access_token).unwrap(), "u1");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let svc = service();
        let pair = svc.issue_pair("u1").unwrap();

        match svc.verify_access(&pair.refresh_token) {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[test]
    fn test_refresh_issues_new_pair() {
        let svc = service();
        let pair = svc.issue_pair("u1").unwrap();

        let refreshed = svc.refresh(&pair.refresh_token).unwrap();
        assert_eq!(svc.verify_access(&refreshed.access_token).unwrap(), "u1");
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = service();
        assert!(svc.verify_access("not-a-jwt").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = service().issue_pair("u1").unwrap();
        let other = TokenService::new("other-secret".to_string(), 900, 1_209_600);

        assert!(other.verify_access(&pair.access_token).is_err());
    }
}

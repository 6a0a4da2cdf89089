//! HS256 token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use dresscode_core::UserId;

use crate::claims::{validate_claims, TokenClaims, TokenKind, TokenValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed or badly signed token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Encode(String),
}

/// Verifies a bearer token and returns its claims.
///
/// The HTTP middleware holds this as `Arc<dyn JwtValidator>`.
pub trait JwtValidator: Send + Sync {
    fn validate(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError>;
}

/// Access + refresh tokens handed out on sign-in and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Symmetric HS256 signer/validator with fixed lifetimes per token kind.
pub struct Hs256Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl Hs256Tokens {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: UserId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = TokenClaims {
            sub: user_id,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    pub fn issue_pair(&self, user_id: UserId, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, TokenKind::Access, now)?,
            refresh_token: self.issue(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Exchange a valid refresh token for a fresh pair.
    pub fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh, now)?;
        self.issue_pair(claims.sub, now)
    }
}

impl JwtValidator for Hs256Tokens {
    fn validate(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        // Time checks are done by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, expected, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(secret: &str) -> Hs256Tokens {
        Hs256Tokens::new(secret.as_bytes(), Duration::minutes(15), Duration::days(15))
    }

    #[test]
    fn issued_access_token_validates() {
        let t = tokens("secret");
        let now = Utc::now();
        let pair = t.issue_pair(UserId::new(9), now).unwrap();

        let claims = t.validate(&pair.access_token, TokenKind::Access, now).unwrap();
        assert_eq!(claims.sub, UserId::new(9));
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn token_signed_with_other_secret_is_malformed() {
        let now = Utc::now();
        let token = tokens("one").issue(UserId::new(1), TokenKind::Access, now).unwrap();
        let err = tokens("two").validate(&token, TokenKind::Access, now).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn access_token_expires_after_ttl() {
        let t = tokens("secret");
        let issued = Utc::now();
        let token = t.issue(UserId::new(1), TokenKind::Access, issued).unwrap();
        let err = t
            .validate(&token, TokenKind::Access, issued + Duration::minutes(16))
            .unwrap_err();
        assert_eq!(err, TokenError::Claims(TokenValidationError::Expired));
    }

    #[test]
    fn refresh_rejects_access_tokens() {
        let t = tokens("secret");
        let now = Utc::now();
        let pair = t.issue_pair(UserId::new(3), now).unwrap();

        assert!(t.refresh(&pair.access_token, now).is_err());
        let renewed = t.refresh(&pair.refresh_token, now).unwrap();
        let claims = t.validate(&renewed.access_token, TokenKind::Access, now).unwrap();
        assert_eq!(claims.sub, UserId::new(3));
    }
}

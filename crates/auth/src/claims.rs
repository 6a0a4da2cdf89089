use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dresscode_core::UserId;

/// Which half of a token pair a token is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every signed token.
///
/// No role claim: the role is looked up per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id).
    pub sub: UserId,

    pub kind: TokenKind,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiration, unix seconds.
    pub exp: i64,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

/// Deterministically validate token claims.
///
/// Signature verification happens in [`crate::jwt`]; this only checks the
/// time window and the token kind.
pub fn validate_claims(
    claims: &TokenClaims,
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.kind != expected {
        return Err(TokenValidationError::WrongKind { expected });
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(kind: TokenKind, iat: DateTime<Utc>, ttl: Duration) -> TokenClaims {
        TokenClaims {
            sub: UserId::new(1),
            kind,
            iat: iat.timestamp(),
            exp: (iat + ttl).timestamp(),
        }
    }

    #[test]
    fn accepts_live_token_of_expected_kind() {
        let now = Utc::now();
        let c = claims(TokenKind::Access, now, Duration::minutes(15));
        assert_eq!(validate_claims(&c, TokenKind::Access, now), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let now = Utc::now();
        let old = claims(TokenKind::Access, now - Duration::hours(1), Duration::minutes(15));
        assert_eq!(
            validate_claims(&old, TokenKind::Access, now),
            Err(TokenValidationError::Expired)
        );

        let future = claims(TokenKind::Access, now + Duration::hours(1), Duration::minutes(15));
        assert_eq!(
            validate_claims(&future, TokenKind::Access, now),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let now = Utc::now();
        let c = claims(TokenKind::Refresh, now, Duration::days(15));
        assert_eq!(
            validate_claims(&c, TokenKind::Access, now),
            Err(TokenValidationError::WrongKind { expected: TokenKind::Access })
        );
    }

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let mut c = claims(TokenKind::Access, now, Duration::minutes(15));
        c.exp = c.iat;
        assert_eq!(
            validate_claims(&c, TokenKind::Access, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}

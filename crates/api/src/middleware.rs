use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use dresscode_auth::{JwtValidator, TokenKind};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Optional bearer authentication.
///
/// No `Authorization` header means an anonymous request; a header that is
/// malformed or carries an invalid or expired access token is rejected with
/// 401 before the handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match extract_bearer(req.headers()) {
        Ok(None) => PrincipalContext::anonymous(),
        Ok(Some(token)) => match state.jwt.validate(token, TokenKind::Access, Utc::now()) {
            Ok(claims) => PrincipalContext::authenticated(claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                return json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "invalid or expired token");
            }
        },
        Err(status) => {
            return json_error(status, "unauthenticated", "malformed authorization header");
        }
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi "),
        );
        assert_eq!(extract_bearer(&headers), Ok(Some("abc.def.ghi")));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer   "),
        );
        assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));
    }
}

//! Bearer token extraction.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::VerifiedIdentity;
use crate::state::AppState;

/// Identity from an optional `Authorization: Bearer` header.
///
/// A request without the header yields `None`. A header that is present but
/// malformed, or a token that fails verification, rejects the request with
/// 401 rather than silently treating the caller as anonymous.
#[derive(Debug, Clone)]
pub struct BearerIdentity(pub Option<VerifiedIdentity>);

/// Extract the raw token from the `Authorization` header.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the header is not a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed Authorization header".to_string()))?;

    let token = value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

    Ok(Some(token))
}

impl FromRequestParts<AppState> for BearerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers)? else {
            return Ok(Self(None));
        };

        let identity = state.identity().verify_token(token).await?;
        set_sentry_user(&identity.subject, identity.email.as_deref());
        tracing::Span::current().record("subject", identity.subject.as_str());

        Ok(Self(Some(identity)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_bearer_token_extracted() {
        let h = headers("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&h).unwrap(), Some("abc.def.ghi"));

        let h = headers("bearer abc");
        assert_eq!(bearer_token(&h).unwrap(), Some("abc"));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(bearer_token(&headers("Bearer ")).is_err());
        assert!(bearer_token(&headers("token")).is_err());
    }
}

//! RS256 access-token verification against a JSON Web Key Set.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use super::identity::{IdentityError, VerifiedIdentity};

/// Claims read from an access token. Registered claims (`exp`, `iss`, `aud`)
/// are checked by `jsonwebtoken` and not kept.
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Checks signature, issuer, audience and expiry of access tokens.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    /// Create a verifier for tokens issued by `issuer` for `audience`.
    #[must_use]
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Read the key id from an RS256 token header without verifying anything.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` if the header is malformed, the
    /// algorithm is not RS256, or there is no `kid`.
    pub fn key_id(token: &str) -> Result<String, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("token header has no kid".to_owned()))
    }

    /// Verify a token with the key named `kid` from `keys`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` if the key is not in the set or
    /// the token fails validation, `IdentityError::Jwks` if the key itself
    /// cannot be used.
    pub fn verify(
        &self,
        token: &str,
        kid: &str,
        keys: &JwkSet,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let jwk = keys
            .find(kid)
            .ok_or_else(|| IdentityError::InvalidToken(format!("unknown signing key {kid}")))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| IdentityError::Jwks(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<AccessClaims>(token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        Ok(VerifiedIdentity {
            subject: data.claims.sub,
            email: data.claims.email,
        })
    }
}

//! Bearer token validation.
//!
//! [`TokenValidator`] runs a fixed sequence of checks and stops at the first
//! failure:
//!
//! 1. header present
//! 2. `Bearer <token>` shape
//! 3. HMAC algorithm family, then signature
//! 4. expiry
//! 5. claims decode into [`TokenClaims`]
//! 6. token subject equals the resource owner
//!
//! Claim content is never looked at before step 3 succeeds.
//!
//! [`OwnerIdentity`] runs the same sequence as an axum extractor, so a handler
//! only runs once the token checks out, and it receives the identity as an
//! ordinary argument.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path},
    http::{header, request::Parts},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{decode, errors::ErrorKind as JwtErrorKind, Validation};
use keygate_common::{
    auth::{is_hmac_algorithm, RequestIdentity, SigningConfig, TokenClaims},
    error::{AuthError, AuthResult},
};
use serde::Deserialize;

use crate::AppState;

/// Verifies bearer tokens against the shared signing configuration.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    signing: Arc<SigningConfig>,
    validation: Validation,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl TokenValidator {
    pub fn new(signing: Arc<SigningConfig>) -> Self {
        let validation = signing.validation();
        Self { signing, validation }
    }

    /// Run the full check for a request on a resource owned by `owner`.
    pub fn validate(&self, authorization: Option<&str>, owner: Option<&str>) -> AuthResult<RequestIdentity> {
        let identity = self.authenticate(authorization)?;
        authorize(identity, owner)
    }

    /// Steps 1 to 5: establish who the token speaks for.
    pub fn authenticate(&self, authorization: Option<&str>) -> AuthResult<RequestIdentity> {
        let token = bearer_token(authorization)?;
        let payload = self.verify(token)?;
        let claims: TokenClaims =
            serde_json::from_value(payload).map_err(|e| AuthError::Decoding(e.to_string()))?;
        Ok(claims.into())
    }

    /// Steps 3 and 4. Returns the verified but still untyped payload.
    fn verify(&self, token: &str) -> AuthResult<serde_json::Value> {
        let alg = peek_algorithm(token)?;
        if !is_hmac_algorithm(&alg) {
            return Err(AuthError::SigningMethod(alg));
        }

        decode::<serde_json::Value>(token, self.signing.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .map_err(classify_jwt_error)
    }
}

/// Step 6: the subject must own the requested resource.
pub fn authorize(identity: RequestIdentity, owner: Option<&str>) -> AuthResult<RequestIdentity> {
    match owner {
        Some(owner) if owner == identity.username => Ok(identity),
        _ => Err(AuthError::UserMatch),
    }
}

/// Steps 1 and 2.
fn bearer_token(authorization: Option<&str>) -> AuthResult<&str> {
    let value = match authorization {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Err(AuthError::MissingAuthHeader),
    };

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(*token),
        [_, _] => Err(AuthError::InvalidToken("unsupported authorization scheme".into())),
        _ => Err(AuthError::InvalidToken("bearer token length incorrect".into())),
    }
}

/// Read `alg` from the token header without trusting anything else in it.
fn peek_algorithm(token: &str) -> AuthResult<String> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::ParsingJwt("token must have three segments".into()));
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::ParsingJwt(format!("malformed header: {e}")))?;
    let header: RawHeader = serde_json::from_slice(&raw)
        .map_err(|e| AuthError::ParsingJwt(format!("malformed header: {e}")))?;
    Ok(header.alg)
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        JwtErrorKind::ExpiredSignature
        | JwtErrorKind::ImmatureSignature
        | JwtErrorKind::MissingRequiredClaim(_)
        | JwtErrorKind::InvalidIssuer
        | JwtErrorKind::InvalidAudience
        | JwtErrorKind::InvalidSubject => AuthError::InvalidToken(err.to_string()),
        JwtErrorKind::InvalidAlgorithm | JwtErrorKind::InvalidAlgorithmName => {
            AuthError::SigningMethod(err.to_string())
        }
        _ => AuthError::ParsingJwt(err.to_string()),
    }
}

/// Identity of a caller whose token is valid and whose subject matches the
/// `{username}` path parameter.
#[derive(Debug, Clone)]
pub struct OwnerIdentity(pub RequestIdentity);

impl FromRequestParts<Arc<AppState>> for OwnerIdentity {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let owner = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(mut params)| params.remove("username"));

        let result = match parts.headers.get(header::AUTHORIZATION) {
            None => Err(AuthError::MissingAuthHeader),
            Some(value) => match value.to_str() {
                Ok(value) => state.validator.validate(Some(value), owner.as_deref()),
                Err(_) => Err(AuthError::InvalidToken(
                    "authorization header is not visible ASCII".into(),
                )),
            },
        };

        match result {
            Ok(identity) => {
                tracing::debug!(token_id = %identity.token_id, "Token accepted");
                Ok(Self(identity))
            }
            Err(err) => {
                let kind = err.kind();
                tracing::warn!(
                    path = %parts.uri.path(),
                    error_type = kind.name(),
                    code = kind.code(),
                    "Rejected request"
                );
                Err(err)
            }
        }
    }
}

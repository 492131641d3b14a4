//! Token issuance.
//!
//! No password verification happens here: any submitted credential gets a
//! token for its username. Checking the password against a real store belongs
//! in front of this.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Header};
use keygate_common::{
    auth::{Credential, SigningConfig, TokenClaims, TokenEnvelope},
    error::{AuthError, AuthResult},
};
use uuid::Uuid;

/// Builds and signs short-lived bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    signing: Arc<SigningConfig>,
}

impl TokenIssuer {
    pub fn new(signing: Arc<SigningConfig>) -> Self {
        Self { signing }
    }

    /// Signing configuration this issuer uses.
    pub fn signing(&self) -> &SigningConfig {
        &self.signing
    }

    /// Issue a token expiring one TTL from now.
    pub fn issue(&self, credential: &Credential) -> AuthResult<TokenEnvelope> {
        self.issue_at(credential, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, credential: &Credential, now: DateTime<Utc>) -> AuthResult<TokenEnvelope> {
        let expires_at = now
            .checked_add_signed(self.signing.token_ttl())
            .ok_or_else(|| AuthError::Encoding("token expiry out of range".into()))?
            .timestamp();
        let claims = TokenClaims {
            sub: credential.username.clone(),
            iat: now.timestamp(),
            exp: expires_at,
            jti: Uuid::new_v4(),
        };

        let token = encode(
            &Header::new(self.signing.algorithm()),
            &claims,
            self.signing.encoding_key(),
        )
        .map_err(|e| AuthError::Encoding(e.to_string()))?;

        tracing::debug!(token_id = %claims.jti, exp = claims.exp, "Issued token");

        Ok(TokenEnvelope {
            token_type: "Bearer".to_string(),
            access_token: token,
            expires_in: self.signing.token_ttl_secs(),
            expires_at,
        })
    }
}

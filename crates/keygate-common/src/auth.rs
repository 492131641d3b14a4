//! Shared token types and signing configuration.
//!
//! Claims and key material live here so the issuer and the validator agree on
//! one definition. Issuance and the validation state machine are in keygate-api.

use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Algorithm names accepted in a token header. Anything else (asymmetric
/// families, "none") is rejected before signature verification.
pub const HMAC_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Longest token lifetime accepted in configuration (one day).
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

/// Largest clock-skew tolerance accepted in configuration.
pub const MAX_LEEWAY_SECS: u64 = 300;

/// Whether `alg` names a member of the HMAC family.
pub fn is_hmac_algorithm(alg: &str) -> bool {
    HMAC_ALGORITHMS.contains(&alg)
}

/// Username/password pair submitted for issuance.
///
/// Missing fields deserialize to empty strings. The password is never
/// embedded in a token and never printed.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token ID, used to correlate issuance and use in logs
    pub jti: Uuid,
}

/// Identity taken from a verified token, handed to exactly one request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub username: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub token_id: Uuid,
}

impl From<TokenClaims> for RequestIdentity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            username: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_id: claims.jti,
        }
    }
}

/// Token returned by the issuance endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub token_type: String,
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    /// Absolute expiry (Unix timestamp)
    pub expires_at: i64,
}

/// Key material and expiry policy shared by the issuer and the validator.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct SigningConfig {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    token_ttl_secs: u64,
    leeway_secs: u64,
}

impl SigningConfig {
    /// Build from a raw secret. Fails on an empty secret, a non-HMAC algorithm,
    /// a TTL outside `1..=MAX_TOKEN_TTL_SECS` or a leeway above `MAX_LEEWAY_SECS`.
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        token_ttl_secs: u64,
        leeway_secs: u64,
    ) -> Result<Self, config::ConfigError> {
        if secret.is_empty() {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must not be empty".into(),
            ));
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(config::ConfigError::Message(format!(
                "auth.algorithm must be one of {HMAC_ALGORITHMS:?}, got {algorithm:?}"
            )));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            return Err(config::ConfigError::Message(format!(
                "auth.token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}, got {token_ttl_secs}"
            )));
        }
        if leeway_secs > MAX_LEEWAY_SECS {
            return Err(config::ConfigError::Message(format!(
                "auth.leeway_secs must be at most {MAX_LEEWAY_SECS}, got {leeway_secs}"
            )));
        }
        let token_ttl = i64::try_from(token_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                config::ConfigError::Message(format!("auth.token_ttl_secs out of range: {token_ttl_secs}"))
            })?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl,
            token_ttl_secs,
            leeway_secs,
        })
    }

    pub fn from_auth_config(auth: &AuthConfig) -> Result<Self, config::ConfigError> {
        let algorithm = Algorithm::from_str(auth.algorithm.trim()).map_err(|_| {
            config::ConfigError::Message(format!("unknown auth.algorithm '{}'", auth.algorithm))
        })?;
        Self::new(
            auth.jwt_secret.as_bytes(),
            algorithm,
            auth.token_ttl_secs,
            auth.leeway_secs,
        )
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Validation rules: the configured algorithm only, `exp` required and
    /// checked with the configured leeway.
    ///
    /// A token is rejected once `exp < now - leeway` in whole seconds, so with
    /// zero leeway it is still accepted during the second `now == exp`.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(secret: &str, algorithm: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            algorithm: algorithm.into(),
            token_ttl_secs: 10,
            leeway_secs: 0,
        }
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(SigningConfig::from_auth_config(&auth_config("", "HS256")).is_err());
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        assert!(SigningConfig::from_auth_config(&auth_config("secret", "RS256")).is_err());
        assert!(SigningConfig::from_auth_config(&auth_config("secret", "none")).is_err());
    }

    #[test]
    fn ttl_out_of_range_is_rejected() {
        assert!(SigningConfig::new(b"k", Algorithm::HS256, 0, 0).is_err());
        assert!(SigningConfig::new(b"k", Algorithm::HS256, MAX_TOKEN_TTL_SECS + 1, 0).is_err());
        assert!(SigningConfig::new(b"k", Algorithm::HS256, 10_000_000_000_000_000, 0).is_err());
        assert!(SigningConfig::new(b"k", Algorithm::HS256, u64::MAX, 0).is_err());

        let max = SigningConfig::new(b"k", Algorithm::HS256, MAX_TOKEN_TTL_SECS, 0).unwrap();
        assert_eq!(max.token_ttl(), Duration::seconds(MAX_TOKEN_TTL_SECS as i64));
    }

    #[test]
    fn leeway_above_cap_is_rejected() {
        assert!(SigningConfig::new(b"k", Algorithm::HS256, 10, MAX_LEEWAY_SECS + 1).is_err());
        assert!(SigningConfig::new(b"k", Algorithm::HS256, 10, u64::MAX).is_err());
        assert!(SigningConfig::new(b"k", Algorithm::HS256, 10, MAX_LEEWAY_SECS).is_ok());
    }

    #[test]
    fn hmac_algorithms_are_accepted() {
        for alg in HMAC_ALGORITHMS {
            let cfg = SigningConfig::from_auth_config(&auth_config("secret", alg)).unwrap();
            assert_eq!(format!("{:?}", cfg.algorithm()), alg);
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = SigningConfig::from_auth_config(&auth_config("hunter2", "HS256")).unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
        assert!(!format!("{:?}", auth_config("hunter2", "HS256")).contains("hunter2"));

        let cred = Credential {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{cred:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn credential_missing_fields_default_to_empty() {
        let cred: Credential = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(cred.username, "alice");
        assert_eq!(cred.password, "");
    }
}

//! Error taxonomy for token issuance and validation.
//!
//! Every failure point in the validation state machine has exactly one
//! [`ErrorKind`], and every kind has a stable numeric code. Codes are part of
//! the wire contract: never renumber or reuse one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Failure category with a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorKind {
    SigningMethod = 1000,
    ParsingJwt = 1001,
    UserMatch = 1002,
    InvalidToken = 1003,
    MissingAuthHeader = 1004,
    Decoding = 1005,
    Encoding = 1006,
}

impl ErrorKind {
    /// All categories, in code order.
    pub const ALL: [ErrorKind; 7] = [
        Self::SigningMethod,
        Self::ParsingJwt,
        Self::UserMatch,
        Self::InvalidToken,
        Self::MissingAuthHeader,
        Self::Decoding,
        Self::Encoding,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Type name reported to clients in the `type` field.
    pub fn name(self) -> &'static str {
        match self {
            Self::SigningMethod => "SigningMethodError",
            Self::ParsingJwt => "ParsingJWTError",
            Self::UserMatch => "UserMatchError",
            Self::InvalidToken => "InvalidTokenError",
            Self::MissingAuthHeader => "MissingAuthHeaderError",
            Self::Decoding => "DecodingError",
            Self::Encoding => "EncodingError",
        }
    }

    /// HTTP status used when this category is surfaced over HTTP.
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::MissingAuthHeader | Self::InvalidToken | Self::ParsingJwt | Self::SigningMethod => {
                StatusCode::UNAUTHORIZED
            }
            Self::Decoding => StatusCode::BAD_REQUEST,
            Self::UserMatch => StatusCode::FORBIDDEN,
            Self::Encoding => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors produced while issuing or validating a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthHeader,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("unexpected signing method: {0}")]
    SigningMethod(String),

    #[error("error parsing JWT: {0}")]
    ParsingJwt(String),

    #[error("error decoding claims: {0}")]
    Decoding(String),

    #[error("token subject does not match the requested user")]
    UserMatch,

    #[error("error encoding token: {0}")]
    Encoding(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAuthHeader => ErrorKind::MissingAuthHeader,
            Self::InvalidToken(_) => ErrorKind::InvalidToken,
            Self::SigningMethod(_) => ErrorKind::SigningMethod,
            Self::ParsingJwt(_) => ErrorKind::ParsingJwt,
            Self::Decoding(_) => ErrorKind::Decoding,
            Self::UserMatch => ErrorKind::UserMatch,
            Self::Encoding(_) => ErrorKind::Encoding,
        }
    }

    /// Encode this error into its client-facing body.
    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse::encode(self.kind(), self.to_string())
    }
}

/// JSON error body sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: u16,
}

impl ErrorResponse {
    /// Build the body for `kind`. Only the category passed in is ever reported.
    pub fn encode(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.name(),
            code: kind.code(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Encoding {
            tracing::error!("Token encoding failed: {}", self);
        }
        (kind.status_code(), axum::Json(self.to_response_body())).into_response()
    }
}

/// Convenience type alias for Results using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_distinct_and_stable() {
        let codes: HashSet<u16> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
        assert_eq!(ErrorKind::SigningMethod.code(), 1000);
        assert_eq!(ErrorKind::ParsingJwt.code(), 1001);
        assert_eq!(ErrorKind::UserMatch.code(), 1002);
        assert_eq!(ErrorKind::InvalidToken.code(), 1003);
        assert_eq!(ErrorKind::Encoding.code(), 1006);
    }

    #[test]
    fn names_are_distinct() {
        let names: HashSet<&str> = ErrorKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn encode_reports_only_the_given_category() {
        let body = ErrorResponse::encode(ErrorKind::UserMatch, "nope");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "nope", "type": "UserMatchError", "code": 1002 })
        );
    }

    #[test]
    fn auth_error_maps_to_kind_and_status() {
        let err = AuthError::ParsingJwt("InvalidSignature".into());
        assert_eq!(err.kind(), ErrorKind::ParsingJwt);
        assert_eq!(err.kind().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_response_body().message, "error parsing JWT: InvalidSignature");

        assert_eq!(AuthError::UserMatch.kind().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Decoding("x".into()).kind().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Encoding("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

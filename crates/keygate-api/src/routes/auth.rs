//! Token issuance routes.
//!
//! `/authenticate` and `/authorize` are the same endpoint under the two names
//! deployments use for it.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use keygate_common::{
    auth::Credential,
    error::{AuthError, AuthResult},
};
use std::sync::Arc;

use crate::AppState;

/// Auth router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authenticate", post(issue_token))
        .route("/authorize", post(issue_token))
}

/// POST /authenticate
///
/// Turn a `{username, password}` body into a signed bearer token. A body that
/// is not valid JSON, or lacks either field, is treated as empty strings.
async fn issue_token(State(state): State<Arc<AppState>>, body: Bytes) -> AuthResult<Response> {
    let credential: Credential = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!("Unreadable credential body, issuing for empty credential: {e}");
        Credential::default()
    });

    let envelope = state.issuer.issue(&credential)?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", envelope.access_token))
        .map_err(|e| AuthError::Encoding(e.to_string()))?;

    tracing::info!(expires_at = envelope.expires_at, "Token issued");

    Ok(([(header::AUTHORIZATION, bearer)], Json(envelope)).into_response())
}

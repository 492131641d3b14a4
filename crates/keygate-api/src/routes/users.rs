//! User-scoped resources. Every route here needs a token whose subject is the
//! `{username}` in the path.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::{middleware::OwnerIdentity, AppState};

/// User resource router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{username}/creds", get(show_identity))
        .route("/users/{username}/articles", get(show_identity))
}

#[derive(Serialize)]
struct IdentityResponse {
    username: String,
    issued_at: i64,
    expires_at: i64,
}

/// GET /users/{username}/creds — the identity the presented token was issued for.
async fn show_identity(OwnerIdentity(identity): OwnerIdentity) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        username: identity.username,
        issued_at: identity.issued_at,
        expires_at: identity.expires_at,
    })
}

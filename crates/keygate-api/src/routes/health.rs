//! Liveness probe. Reports the signing policy in force so operators can check
//! that every instance behind a balancer shares the same settings.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    algorithm: String,
    token_ttl_secs: u64,
}

/// Health router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let signing = state.issuer.signing();
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        algorithm: format!("{:?}", signing.algorithm()),
        token_ttl_secs: signing.token_ttl_secs(),
    })
}

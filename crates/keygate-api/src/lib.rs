//! # keygate-api
//!
//! HTTP layer for keygate: the token issuance endpoint, the bearer token
//! validator, and the user-scoped routes it guards.

pub mod auth;
pub mod middleware;
pub mod routes;

use axum::Router;
use keygate_common::auth::SigningConfig;
use std::{sync::Arc, time::Instant};

use crate::{auth::TokenIssuer, middleware::TokenValidator};

/// Shared application state available to all route handlers.
///
/// Read-only after startup. Nothing request-specific is stored here.
#[derive(Debug)]
pub struct AppState {
    pub issuer: TokenIssuer,
    pub validator: TokenValidator,
    pub started_at: Instant,
}

impl AppState {
    /// Issuer and validator built over the same signing configuration.
    pub fn new(signing: Arc<SigningConfig>) -> Self {
        Self {
            issuer: TokenIssuer::new(signing.clone()),
            validator: TokenValidator::new(signing),
            started_at: Instant::now(),
        }
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::health::router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

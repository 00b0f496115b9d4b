//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, hasher and token codec shared by handlers
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent `{"error": ...}` responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use usergate_auth::Authenticator;
use usergate_infra::{AppConfig, UserStore};

use crate::{cors, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig, store: Arc<dyn UserStore>) -> Router {
    let services = Arc::new(services::AppServices::new(store.clone(), &config.auth));

    let gate = middleware::GateState {
        authenticator: Authenticator::new(services.tokens.clone(), config.auth.admin_id),
        liveness: config.auth.verify_identity_exists.then_some(store),
    };

    // Protected routes: require a valid bearer token. `route_layer` keeps the
    // gate off unmatched paths and methods, which fall through to 404 / 405.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        gate,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&config.cors_allowed_origins)))
}

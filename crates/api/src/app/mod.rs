//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: role checks and validation in front of the store
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and wire-format mapping
//! - `errors.rs`: `ServiceError` and consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.jwt_validator(),
    };

    // `/api` accepts anonymous callers; handlers that need a user say so.
    let api = routes::api_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .nest("/api", api)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

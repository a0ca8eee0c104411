//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per resource area)
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// With `DATABASE_URL` set the app runs against Postgres; without it, an
/// in-memory store that forgets everything on restart.
pub async fn build_app() -> Router {
    let services = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");
            services::build_services(Arc::new(motorpool_infra::PostgresStore::new(pool)))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory store");
            services::build_services(Arc::new(motorpool_infra::InMemoryStore::new()))
        }
    };
    build_app_with(Arc::new(services))
}

/// Build the router over pre-wired services. Tests use this to run the prod
/// router against an in-memory store.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    // Protected routes: require an authenticated principal.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

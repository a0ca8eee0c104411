use axum::Router;

pub mod common;
pub mod invites;
pub mod lists;
pub mod notifications;
pub mod shops;
pub mod system;
pub mod vehicles;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(shops::router())
        .merge(invites::router())
        .merge(vehicles::router())
        .merge(notifications::router())
        .merge(lists::router())
}

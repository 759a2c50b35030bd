use axum::Router;

pub mod inventory;
pub mod products;
pub mod system;

/// Router for all website-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/products", products::router())
}

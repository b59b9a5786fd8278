use axum::Router;

pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod staff;
pub mod suppliers;
pub mod system;

/// Router for every resource endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/orders", orders::router())
        .nest("/suppliers", suppliers::router())
        .nest("/customers", customers::router())
        .nest("/staff", staff::router())
        .nest("/dashboard", dashboard::router())
}

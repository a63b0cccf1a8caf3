use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod settings;
pub mod shop;
pub mod stock;
pub mod users;
pub mod wilayas;

/// Back-office resources mounted under `/api/main`.
fn main_router() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/stock", stock::router())
        .nest("/wilayas", wilayas::router())
        .nest("/baladias", wilayas::baladia_router())
        .nest("/orders", orders::router())
        .nest("/coupons", coupons::router())
        .nest("/users", users::router())
        .nest("/settings", settings::router())
        .nest("/dashboard", dashboard::router())
}

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/main", main_router())
        .nest("/shop", shop::router())
}

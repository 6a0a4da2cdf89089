use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod auth;
pub mod common;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
pub fn api_router() -> Router {
    Router::new()
        .route("/new-admin", post(users::new_admin))
        .route("/new-buyer", post(users::new_buyer))
        .route("/remove-buyer", delete(users::remove_buyer))
        .route("/my-id", get(users::my_id))
        .route("/my-role", get(users::my_role))
        .route("/my-user", get(users::my_user))
        .nest("/products", products::router())
        .nest("/reviews", reviews::router())
        .nest("/orders", orders::router())
}

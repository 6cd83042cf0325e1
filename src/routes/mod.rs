pub mod auth;
pub mod collections;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/session", get(auth::session))
        // Collections
        .route("/api/v1/collections", get(collections::list))
        .route(
            "/api/v1/collections/{entity}/records",
            get(collections::records),
        )
        .route(
            "/api/v1/collections/{entity}/records/{id}/status",
            put(collections::update_status),
        )
        .route(
            "/api/v1/collections/{entity}/export",
            get(collections::export),
        )
}

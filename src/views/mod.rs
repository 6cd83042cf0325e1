pub mod auth;
pub mod browser;
pub mod dashboard;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

/// Link in the admin navigation bar.
pub(crate) struct NavLink {
    pub key: &'static str,
    pub title: &'static str,
    pub active: bool,
}

pub(crate) fn nav_links(state: &SharedState, active: &str) -> Vec<NavLink> {
    state
        .catalog
        .list()
        .iter()
        .map(|e| NavLink {
            key: e.key,
            title: e.title,
            active: e.key == active,
        })
        .collect()
}

/// Login and logout. These render their own errors, so they sit outside the
/// unauthorized-redirect layer.
pub fn auth_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(auth::root))
        .route("/admin", get(auth::root))
        .route("/admin/login", get(auth::login_page).post(auth::login_submit))
        .route("/admin/logout", post(auth::logout))
}

/// Session-gated admin pages and HTMX partials.
pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Dashboard
        .route("/admin/dashboard", get(dashboard::index))
        // Record browser
        .route("/admin/{entity}", get(browser::page))
        .route("/admin/{entity}/rows", get(browser::rows))
        .route("/admin/{entity}/records/{id}", get(browser::detail))
        .route("/admin/{entity}/records/{id}/status", post(browser::set_status))
        .route("/admin/{entity}/export", get(browser::export))
}

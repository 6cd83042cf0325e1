use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use super::{nav_links, NavLink};
use crate::auth::extractor::Session;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    username: String,
    nav: Vec<NavLink>,
    backend: String,
    entries: Vec<EntityCount>,
}

struct EntityCount {
    key: &'static str,
    title: &'static str,
    count: Option<i64>,
}

pub async fn index(session: Session, State(state): State<SharedState>) -> impl IntoResponse {
    let mut entries = Vec::new();
    for entity in state.catalog.list() {
        // A failing collection still gets a card, just without a count.
        let count = match state.source.count(entity.collection).await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::error!(entity = entity.key, "Error counting records: {e}");
                None
            }
        };
        entries.push(EntityCount {
            key: entity.key,
            title: entity.title,
            count,
        });
    }

    let template = DashboardTemplate {
        username: session.username,
        nav: nav_links(&state, ""),
        backend: state.source.backend().to_string(),
        entries,
    };
    Html(template.render().unwrap_or_default())
}

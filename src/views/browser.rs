use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use uuid::Uuid;

use super::{nav_links, NavLink};
use crate::auth::extractor::Session;
use crate::browser::present::{self, DetailView, TableView};
use crate::browser::{ActionOrigin, MutationError, Notification, QueryController, QueryOutcome};
use crate::error::AppError;
use crate::routes::collections::{csv_response, export_unfiltered, lookup};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "browser/page.html")]
struct PageTemplate {
    username: String,
    nav: Vec<NavLink>,
    title: &'static str,
    entity_key: &'static str,
    view_id: String,
    search: String,
    table: TableView,
    toast: Option<Notification>,
}

#[derive(Template)]
#[template(path = "browser/rows.html")]
struct RowsTemplate {
    entity_key: &'static str,
    table: TableView,
    toast: Option<Notification>,
    close_dialog: bool,
}

#[derive(Template)]
#[template(path = "browser/detail.html")]
struct DetailTemplate {
    entity_key: &'static str,
    detail: DetailView,
}

#[derive(Template)]
#[template(path = "browser/toast.html")]
struct ToastTemplate {
    toast: Notification,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct RowsParams {
    pub view: Uuid,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewParam {
    pub view: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub view: Uuid,
    pub status: String,
    pub origin: String,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// The view was evicted or never existed: send the browser back to a fresh mount.
fn view_expired(entity_key: &str, headers: &HeaderMap) -> Response {
    let url = format!("/admin/{entity_key}");
    if is_htmx(headers) {
        let mut response = StatusCode::OK.into_response();
        if let Ok(value) = HeaderValue::from_str(&url) {
            response.headers_mut().insert("hx-redirect", value);
        }
        response
    } else {
        Redirect::to(&url).into_response()
    }
}

fn toast_only(status: StatusCode, toast: Notification) -> Response {
    let body = ToastTemplate { toast }.render().unwrap_or_default();
    let mut response = (status, Html(body)).into_response();
    response
        .headers_mut()
        .insert("hx-reswap", HeaderValue::from_static("none"));
    response
}

/// Mount a new view for the entity and render it with its initial fetch.
pub async fn page(
    session: Session,
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &key)?;
    let view = state.views.mount(entity.clone(), state.source.clone());

    let search = params.search.unwrap_or_default();
    let toast = match view.controller.search(&search).await {
        QueryOutcome::Failed(n) => Some(n),
        _ => None,
    };
    let records = view.controller.snapshot().await;

    let template = PageTemplate {
        username: session.username,
        nav: nav_links(&state, entity.key),
        title: entity.title,
        entity_key: entity.key,
        view_id: view.id.to_string(),
        search,
        table: present::table(&entity, &records),
        toast,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

/// Search-as-you-type. A superseded response renders nothing.
pub async fn rows(
    _session: Session,
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(params): Query<RowsParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &key)?;
    let Some(view) = state.views.get(params.view, entity.key) else {
        return Ok(view_expired(entity.key, &headers));
    };

    let term = params.search.unwrap_or_default();
    let toast = match view.controller.search(&term).await {
        QueryOutcome::Superseded => return Ok(StatusCode::NO_CONTENT.into_response()),
        QueryOutcome::Failed(n) => Some(n),
        QueryOutcome::Applied { .. } => None,
    };

    Ok(render_rows(&view.controller, toast, false).await)
}

async fn render_rows(
    controller: &QueryController,
    toast: Option<Notification>,
    close_dialog: bool,
) -> Response {
    let entity = controller.entity();
    let records = controller.snapshot().await;
    let template = RowsTemplate {
        entity_key: entity.key,
        table: present::table(entity, &records),
        toast,
        close_dialog,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn detail(
    _session: Session,
    State(state): State<SharedState>,
    Path((key, id)): Path<(String, String)>,
    Query(params): Query<ViewParam>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &key)?;
    let Some(view) = params.view.and_then(|v| state.views.get(v, entity.key)) else {
        return Ok(view_expired(entity.key, &headers));
    };

    let record = view
        .controller
        .record(&id)
        .await
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;

    let template = DetailTemplate {
        entity_key: entity.key,
        detail: present::detail(&entity, &record),
    };
    Ok(Html(template.render().unwrap_or_default()).into_response())
}

pub async fn set_status(
    session: Session,
    State(state): State<SharedState>,
    Path((key, id)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &key)?;
    let origin = ActionOrigin::parse(&form.origin)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown action origin '{}'", form.origin)))?;
    let Some(view) = state.views.get(form.view, entity.key) else {
        return Ok(view_expired(entity.key, &headers));
    };

    match view.controller.set_status(&id, &form.status, origin).await {
        Ok(change) => {
            tracing::info!(user = %session.username, entity = entity.key, id = %id, "Status changed");
            Ok(render_rows(&view.controller, Some(change.notification), origin == ActionOrigin::Detail).await)
        }
        Err(MutationError::Failed(n)) => Ok(render_rows(&view.controller, Some(n), false).await),
        Err(err @ MutationError::NotAllowed { .. }) => Ok(toast_only(
            StatusCode::CONFLICT,
            Notification::error(format!("Action not allowed: {err}")),
        )),
        Err(err) => Err(err.into()),
    }
}

/// CSV download. Uses the view's records when the view is still mounted;
/// otherwise a fresh controller fetches what the entity's export needs.
pub async fn export(
    _session: Session,
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(params): Query<ViewParam>,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &key)?;
    let today = chrono::Utc::now().date_naive();

    let export = match params.view.and_then(|v| state.views.get(v, entity.key)) {
        Some(view) => view
            .controller
            .export(today)
            .await
            .map_err(|n| AppError::Upstream(n.message))?,
        None => export_unfiltered(entity.clone(), state.source.clone(), today).await?,
    };

    tracing::info!(entity = entity.key, rows = export.rows, "Exported CSV");
    Ok(csv_response(export))
}

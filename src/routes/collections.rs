use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::Session;
use crate::browser::export::CsvExport;
use crate::browser::{
    ActionOrigin, EntityConfig, ExportSource, MutationError, QueryController, QueryOutcome,
};
use crate::db::RecordSource;
use crate::error::AppError;
use crate::models::Record;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct EntitySummary {
    pub key: &'static str,
    pub title: &'static str,
    pub collection: &'static str,
    pub search_field: &'static str,
    pub mutable: bool,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct RecordsResponse {
    pub entity: &'static str,
    pub search: String,
    pub total: usize,
    pub records: Vec<Record>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub origin: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub record: Option<Record>,
    pub message: String,
}

pub(crate) fn lookup(state: &SharedState, key: &str) -> Result<Arc<EntityConfig>, AppError> {
    state
        .catalog
        .get(key)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Unknown collection '{key}'")))
}

pub(crate) fn csv_response(export: CsvExport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    )
        .into_response()
}

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::NotMutable | MutationError::UnsupportedStatus(_) => {
                AppError::BadRequest(err.to_string())
            }
            MutationError::NotAllowed { .. } => AppError::Conflict(err.to_string()),
            MutationError::MissingRecord(_) => AppError::NotFound(err.to_string()),
            MutationError::Failed(n) => AppError::Upstream(n.message),
        }
    }
}

pub async fn list(_session: Session, State(state): State<SharedState>) -> Json<Vec<EntitySummary>> {
    Json(
        state
            .catalog
            .list()
            .iter()
            .map(|e| EntitySummary {
                key: e.key,
                title: e.title,
                collection: e.collection,
                search_field: e.search_field,
                mutable: e.is_mutable(),
            })
            .collect(),
    )
}

pub async fn records(
    _session: Session,
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<RecordsResponse>, AppError> {
    let entity = lookup(&state, &key)?;
    let controller = QueryController::new(entity.clone(), state.source.clone());
    let search = params.search.unwrap_or_default();

    if let QueryOutcome::Failed(n) = controller.search(&search).await {
        return Err(AppError::Upstream(n.message));
    }

    let records = controller.snapshot().await;
    Ok(Json(RecordsResponse {
        entity: entity.key,
        search: controller.term().await,
        total: records.len(),
        records,
    }))
}

pub async fn update_status(
    session: Session,
    State(state): State<SharedState>,
    Path((key, id)): Path<(String, String)>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let entity = lookup(&state, &key)?;
    let origin = match req.origin.as_deref() {
        None => ActionOrigin::Detail,
        Some(s) => ActionOrigin::parse(s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown action origin '{s}'")))?,
    };

    // The policy is checked against the record as currently stored.
    let controller = QueryController::new(entity, state.source.clone());
    if let QueryOutcome::Failed(n) = controller.fetch_all().await {
        return Err(AppError::Upstream(n.message));
    }

    let change = controller.set_status(&id, &req.status, origin).await?;
    tracing::info!(user = %session.username, collection = %key, id = %id, "Status changed via API");

    Ok(Json(StatusResponse {
        record: change.record,
        message: change.notification.message,
    }))
}

/// Export without a mounted view. Filtered exports read the controller's
/// records, so those are loaded first; full exports fetch on their own.
pub(crate) async fn export_unfiltered(
    entity: Arc<EntityConfig>,
    source: Arc<dyn RecordSource>,
    today: NaiveDate,
) -> Result<CsvExport, AppError> {
    let preload = entity.export.source == ExportSource::Filtered;
    let controller = QueryController::new(entity, source);
    if preload {
        if let QueryOutcome::Failed(n) = controller.fetch_all().await {
            return Err(AppError::Upstream(n.message));
        }
    }

    controller
        .export(today)
        .await
        .map_err(|n| AppError::Upstream(n.message))
}

/// CSV of the whole collection, fetched fresh.
pub async fn export(
    _session: Session,
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &key)?;
    let export =
        export_unfiltered(entity, state.source.clone(), chrono::Utc::now().date_naive()).await?;
    Ok(csv_response(export))
}

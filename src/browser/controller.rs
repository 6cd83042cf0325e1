use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::entity::{ActionOrigin, EntityConfig, ExportSource, FailurePolicy};
use super::export::{self, CsvExport};
use super::notify::Notification;
use super::store::RecordStore;
use crate::db::{RecordSource, StoreError, TextMatch};
use crate::models::{Record, ReviewStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The result replaced the held records.
    Applied { count: usize },
    /// A newer query was issued while this one was in flight; its result was dropped.
    Superseded,
    /// The query failed; the held records follow the entity's failure policy.
    Failed(Notification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// The patched local record, if the current snapshot contains it.
    pub record: Option<Record>,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationError {
    NotMutable,
    UnsupportedStatus(String),
    NotAllowed {
        id: String,
        current: Option<String>,
        origin: ActionOrigin,
    },
    MissingRecord(String),
    Failed(Notification),
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationError::NotMutable => write!(f, "records of this type cannot be changed"),
            MutationError::UnsupportedStatus(s) => write!(f, "unsupported status '{s}'"),
            MutationError::NotAllowed { id, current, origin } => write!(
                f,
                "{} action not allowed on record {id} with status {}",
                origin.as_str(),
                current.as_deref().unwrap_or("unknown")
            ),
            MutationError::MissingRecord(id) => write!(f, "record {id} not found"),
            MutationError::Failed(n) => write!(f, "{}", n.message),
        }
    }
}

/// Decrements the in-flight counter when a query finishes, however it finishes.
struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Loading(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs fetch, search and status queries for one view and keeps its
/// record store in step with the latest issued query.
pub struct QueryController {
    entity: Arc<EntityConfig>,
    source: Arc<dyn RecordSource>,
    store: Mutex<RecordStore>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl QueryController {
    pub fn new(entity: Arc<EntityConfig>, source: Arc<dyn RecordSource>) -> Self {
        Self {
            entity,
            source,
            store: Mutex::new(RecordStore::new()),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn entity(&self) -> &Arc<EntityConfig> {
        &self.entity
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn fetch_all(&self) -> QueryOutcome {
        self.run("").await
    }

    /// Search by the entity's search field. A blank or whitespace-only term
    /// fetches everything; any other term is matched as given.
    pub async fn search(&self, term: &str) -> QueryOutcome {
        if term.trim().is_empty() {
            self.run("").await
        } else {
            self.run(term).await
        }
    }

    async fn run(&self, term: &str) -> QueryOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = Loading::start(&self.in_flight);
        let entity = &self.entity;

        let result = if term.is_empty() {
            self.source.select_all(entity.collection, entity.order).await
        } else {
            let filter = TextMatch {
                field: entity.search_field,
                term,
                case: entity.case,
            };
            self.source
                .select_matching(entity.collection, filter, entity.order)
                .await
        };

        let mut store = self.store.lock().await;
        if self.generation.load(Ordering::SeqCst) != token {
            tracing::debug!(
                entity = entity.key,
                token,
                "Dropping superseded {} result",
                if term.is_empty() { "fetch" } else { "search" }
            );
            return QueryOutcome::Superseded;
        }

        match result {
            Ok(records) => {
                let count = records.len();
                store.replace(records, term);
                QueryOutcome::Applied { count }
            }
            Err(e) => {
                let noun = entity.title.to_lowercase();
                let message = if term.is_empty() {
                    tracing::error!(entity = entity.key, "Error fetching {noun}: {e}");
                    format!("Failed to fetch {noun} from the database.")
                } else {
                    tracing::error!(entity = entity.key, term, "Error searching {noun}: {e}");
                    format!("Failed to search {noun} in the database.")
                };
                if entity.on_failure == FailurePolicy::Clear {
                    store.replace(Vec::new(), term);
                }
                QueryOutcome::Failed(Notification::error(message))
            }
        }
    }

    pub async fn snapshot(&self) -> Vec<Record> {
        self.store.lock().await.records().to_vec()
    }

    pub async fn record(&self, id: &str) -> Option<Record> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn term(&self) -> String {
        self.store.lock().await.term().to_string()
    }

    /// Write a new status to the store, then patch the local record. Local
    /// state is untouched unless the remote write succeeds.
    pub async fn set_status(
        &self,
        id: &str,
        status: &str,
        origin: ActionOrigin,
    ) -> Result<StatusChange, MutationError> {
        let entity = &self.entity;
        let control = entity.status.as_ref().ok_or(MutationError::NotMutable)?;
        let target = ReviewStatus::parse(status)
            .filter(|s| control.actions.contains(s))
            .ok_or_else(|| MutationError::UnsupportedStatus(status.to_string()))?;

        let current = self
            .record(id)
            .await
            .map(|r| r.text(control.field))
            .filter(|s| !s.is_empty());
        if !control.policy(origin).permits(current.as_deref()) {
            return Err(MutationError::NotAllowed {
                id: id.to_string(),
                current,
                origin,
            });
        }

        // No lock is held here: fetches may interleave with the write.
        if let Err(e) = self
            .source
            .update_field(entity.collection, id, control.field, target.as_str())
            .await
        {
            tracing::error!(entity = entity.key, id, "Error updating status: {e}");
            return Err(match e {
                StoreError::NotFound { id, .. } => MutationError::MissingRecord(id),
                _ => MutationError::Failed(Notification::error(
                    "Failed to update status in the database.",
                )),
            });
        }

        tracing::info!(entity = entity.key, id, status = target.as_str(), "Status updated");

        let mut patch = Map::new();
        patch.insert(
            control.field.to_string(),
            Value::String(target.as_str().to_string()),
        );
        let mut store = self.store.lock().await;
        let record = if store.patch_by_id(id, &patch) {
            store.get(id).cloned()
        } else {
            None
        };

        Ok(StatusChange {
            record,
            notification: Notification::success(format!("Status updated to {target}")),
        })
    }

    /// Build the CSV download. Filtered exports use the held records; full
    /// exports fetch the collection again without touching the held records.
    pub async fn export(&self, today: chrono::NaiveDate) -> Result<CsvExport, Notification> {
        let spec = &self.entity.export;
        let records = match spec.source {
            ExportSource::Filtered => self.snapshot().await,
            ExportSource::FullRefetch => self
                .source
                .select_all(self.entity.collection, self.entity.order)
                .await
                .map_err(|e| {
                    tracing::error!(entity = self.entity.key, "Error fetching data for export: {e}");
                    Notification::error("Failed to fetch data for export.")
                })?,
        };

        Ok(CsvExport {
            filename: export::filename(spec.file_stem, today),
            rows: records.len(),
            body: export::render(&spec.columns, &records),
        })
    }
}

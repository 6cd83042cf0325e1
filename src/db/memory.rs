use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{CaseSensitivity, RecordSource, SortOrder, StoreError, TextMatch};
use crate::models::Record;

/// In-process record source. Used when no database is configured and by the
/// test harness.
#[derive(Default)]
pub struct MemoryRecordSource {
    collections: DashMap<String, Vec<Record>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let source = Self::new();
        for name in names {
            source.collections.entry(name.to_string()).or_default();
        }
        source
    }

    /// Append records to a collection, creating it if needed.
    pub fn insert(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    /// Current contents of a collection in insertion order.
    pub fn dump(&self, collection: &str) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    fn rows(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        self.collections
            .get(collection)
            .map(|rows| rows.value().clone())
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn sort_records(records: &mut [Record], order: SortOrder) {
    // Stable sort: ties keep insertion order.
    records.sort_by(|a, b| {
        let (va, vb) = (a.get(order.field), b.get(order.field));
        match (is_missing(va), is_missing(vb)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_values(va, vb);
                if order.descending { ord.reverse() } else { ord }
            }
        }
    });
}

fn matches(record: &Record, filter: &TextMatch<'_>) -> bool {
    let Some(Value::String(value)) = record.get(filter.field) else {
        return false;
    };
    match filter.case {
        CaseSensitivity::Sensitive => value.contains(filter.term),
        CaseSensitivity::Insensitive => value
            .to_lowercase()
            .contains(&filter.term.to_lowercase()),
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn select_all(
        &self,
        collection: &str,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        let mut rows = self.rows(collection)?;
        sort_records(&mut rows, order);
        Ok(rows)
    }

    async fn select_matching(
        &self,
        collection: &str,
        filter: TextMatch<'_>,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        let mut rows: Vec<Record> = self
            .rows(collection)?
            .into_iter()
            .filter(|r| matches(r, &filter))
            .collect();
        sort_records(&mut rows, order);
        Ok(rows)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut rows = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        record
            .fields
            .insert(field.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        Ok(self.rows(collection)?.len() as i64)
    }
}

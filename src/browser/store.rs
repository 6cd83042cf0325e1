use serde_json::{Map, Value};

use crate::models::Record;

/// The records a view currently shows, in query order.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    term: String,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the result of a query. Nothing from the previous snapshot is kept.
    pub fn replace(&mut self, records: Vec<Record>, term: &str) {
        self.records = records;
        self.term = term.to_string();
    }

    /// Merge `fields` into the record with `id`. Returns false when the
    /// current snapshot does not contain that record.
    pub fn patch_by_id(&mut self, id: &str, fields: &Map<String, Value>) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.apply(fields);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Search term the current snapshot was fetched with.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

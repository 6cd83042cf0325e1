use serde::Serialize;
use serde_json::{Map, Value};

/// One row mirrored from a collection. The key is kept apart from the other
/// columns so every collection can be handled the same way. Numbers keep the
/// digits the store sent (`25.50` stays `25.50`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a record from a JSON row object. Returns `None` when the row is
    /// not an object or has no usable `id`.
    pub fn from_row(row: Value) -> Option<Self> {
        let Value::Object(mut fields) = row else {
            return None;
        };
        let id = match fields.remove("id")? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self { id, fields })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == "id" {
            return None;
        }
        self.fields.get(field)
    }

    /// Display text for a field. Missing and null values render empty.
    pub fn text(&self, field: &str) -> String {
        if field == "id" {
            return self.id.clone();
        }
        match self.fields.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Merge `patch` into this record. The key itself never changes.
    pub fn apply(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

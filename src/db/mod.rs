pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::Record;

pub use memory::MemoryRecordSource;
pub use postgres::PgRecordSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    #[default]
    Insensitive,
    Sensitive,
}

/// Sort applied to every listing: one column, newest first unless `descending`
/// is false. Missing values sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub fn newest_first(field: &'static str) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// Substring filter on a single text column. The term is matched literally.
#[derive(Debug, Clone, Copy)]
pub struct TextMatch<'a> {
    pub field: &'a str,
    pub term: &'a str,
    pub case: CaseSensitivity,
}

#[derive(Debug)]
pub enum StoreError {
    InvalidIdentifier(String),
    UnknownCollection(String),
    NotFound { collection: String, id: String },
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidIdentifier(name) => write!(f, "invalid identifier '{name}'"),
            StoreError::UnknownCollection(name) => write!(f, "unknown collection '{name}'"),
            StoreError::NotFound { collection, id } => {
                write!(f, "record '{id}' not found in '{collection}'")
            }
            StoreError::Database(err) => write!(f, "database error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// The remote store the browser reads from and writes status changes to.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn backend(&self) -> &str;

    async fn select_all(
        &self,
        collection: &str,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError>;

    async fn select_matching(
        &self,
        collection: &str,
        filter: TextMatch<'_>,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError>;

    /// Set one text column of one record. Fails with `NotFound` when no row
    /// has that id.
    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    async fn count(&self, collection: &str) -> Result<i64, StoreError>;
}

/// Collection and column names are interpolated into SQL, so they are limited
/// to lowercase ASCII identifiers.
pub(crate) fn check_identifier(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        && !name.as_bytes()[0].is_ascii_digit();
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

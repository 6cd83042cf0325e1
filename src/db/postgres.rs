use async_trait::async_trait;
use sqlx::PgPool;

use super::{check_identifier, CaseSensitivity, RecordSource, SortOrder, StoreError, TextMatch};
use crate::models::Record;

/// Record source backed by the Postgres collections created by the bundled
/// migrations. Rows are read as `to_jsonb` so one code path serves every table.
#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(order: SortOrder) -> Result<String, StoreError> {
    let field = check_identifier(order.field)?;
    let direction = if order.descending { "DESC" } else { "ASC" };
    Ok(format!("ORDER BY t.{field} {direction} NULLS LAST"))
}

/// Escape LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn into_records(rows: Vec<(serde_json::Value,)>, collection: &str) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|(row,)| {
            let record = Record::from_row(row);
            if record.is_none() {
                tracing::warn!("Skipping row without id in {collection}");
            }
            record
        })
        .collect()
}

#[async_trait]
impl RecordSource for PgRecordSource {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn select_all(
        &self,
        collection: &str,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        let table = check_identifier(collection)?;
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(&format!(
            "SELECT to_jsonb(t) FROM {table} t {}",
            order_clause(order)?
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(into_records(rows, collection))
    }

    async fn select_matching(
        &self,
        collection: &str,
        filter: TextMatch<'_>,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        let table = check_identifier(collection)?;
        let field = check_identifier(filter.field)?;
        let op = match filter.case {
            CaseSensitivity::Insensitive => "ILIKE",
            CaseSensitivity::Sensitive => "LIKE",
        };
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(&format!(
            "SELECT to_jsonb(t) FROM {table} t
             WHERE t.{field} {op} $1 ESCAPE '\\' {}",
            order_clause(order)?
        ))
        .bind(like_pattern(filter.term))
        .fetch_all(&self.pool)
        .await?;
        Ok(into_records(rows, collection))
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let table = check_identifier(collection)?;
        let column = check_identifier(field)?;
        let result = sqlx::query(&format!(
            "UPDATE {table} SET {column} = $2 WHERE id::text = $1"
        ))
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        let table = check_identifier(collection)?;
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

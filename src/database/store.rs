//! Row-level persistence façade used by handlers.
//!
//! Every call checks a connection out of the pool, runs one statement and
//! hands back plain [`Record`] values. SQLite serializes writers, so handlers
//! running for different chats can share one `Store`.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

pub use crate::database::models::record::{Fields, Record};
use crate::database::models::record::{RecordRow, RECORD_COLUMNS};
use crate::utils::datetime::timestamp_now;
use crate::utils::logging::{log_database_error, log_database_operation};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record '{name}' of user {user_id} has malformed fields: {source}")]
    MalformedFields {
        user_id: i64,
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record fields: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Identifies one record: the owner and the record name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub user_id: i64,
    pub name: String,
}

impl RecordKey {
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        Self { user_id, name: name.into() }
    }
}

/// Predicate for [`Store::query`]. Unset parts match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub user_id: Option<i64>,
    pub name_prefix: Option<String>,
    pub field_equals: Option<(String, String)>,
    pub limit: Option<u32>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), ..Self::default() }
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_equals = Some((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Pool for model-level operations (users, maintenance).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        log_database_operation("get", "records", Some(&format!("{}/{}", key.user_id, key.name)));

        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ? AND name = ?"
        ))
        .bind(key.user_id)
        .bind(&key.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.fail("get", e))?;

        row.map(decode).transpose()
    }

    /// Inserts the record or replaces the fields of an existing one.
    pub async fn put(&self, key: &RecordKey, fields: &Fields) -> Result<Record, StoreError> {
        log_database_operation("put", "records", Some(&format!("{}/{}", key.user_id, key.name)));

        let encoded = serde_json::to_string(fields).map_err(StoreError::Encode)?;
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        let mut tx = self.pool.begin().await.map_err(|e| self.fail("put", e))?;

        sqlx::query(
            r#"
            INSERT INTO records (id, user_id, name, fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, name) DO UPDATE SET
                fields = excluded.fields,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(key.user_id)
        .bind(&key.name)
        .bind(&encoded)
        .bind(&now)
        .bind(&now)
        .execute(&mut tx)
        .await
        .map_err(|e| self.fail("put", e))?;

        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ? AND name = ?"
        ))
        .bind(key.user_id)
        .bind(&key.name)
        .fetch_one(&mut tx)
        .await
        .map_err(|e| self.fail("put", e))?;

        tx.commit().await.map_err(|e| self.fail("put", e))?;

        decode(row)
    }

    /// Removes a record. Returns whether it existed.
    pub async fn delete(&self, key: &RecordKey) -> Result<bool, StoreError> {
        log_database_operation("delete", "records", Some(&format!("{}/{}", key.user_id, key.name)));

        let result = sqlx::query("DELETE FROM records WHERE user_id = ? AND name = ?")
            .bind(key.user_id)
            .bind(&key.name)
            .execute(&self.pool)
            .await
            .map_err(|e| self.fail("delete", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Records matching `filter`, ordered by owner and name.
    pub async fn query(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        log_database_operation("query", "records", Some(&format!("{filter:?}")));

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {RECORD_COLUMNS} FROM records WHERE 1 = 1"));

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(prefix) = &filter.name_prefix {
            builder
                .push(" AND name LIKE ")
                .push_bind(format!("{}%", escape_like(prefix)))
                .push(" ESCAPE '\\'");
        }
        if let Some((key, value)) = &filter.field_equals {
            builder
                .push(" AND json_extract(fields, ")
                .push_bind(json_path(key))
                .push(") = ")
                .push_bind(value.clone());
        }
        builder.push(" ORDER BY user_id, name");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = builder
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.fail("query", e))?;

        rows.into_iter().map(decode).collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.fail("count", e))?;
        Ok(count)
    }

    /// Quick connectivity probe used by the health service.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    fn fail(&self, operation: &str, error: sqlx::Error) -> StoreError {
        if !self.pool.is_closed() {
            log_database_error(operation, "records", &error.to_string(), None);
        }
        StoreError::Database(error)
    }
}

fn decode(row: RecordRow) -> Result<Record, StoreError> {
    let (user_id, name) = (row.user_id, row.name.clone());
    row.into_record()
        .map_err(|source| StoreError::MalformedFields { user_id, name, source })
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("my_note"), "my\\_note");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_json_path_quotes_key() {
        assert_eq!(json_path("city"), "$.\"city\"");
    }

    #[test]
    fn test_filter_builders() {
        let filter = RecordFilter::for_user(7).with_name_prefix("no").with_field("k", "v").limit(3);
        assert_eq!(filter.user_id, Some(7));
        assert_eq!(filter.name_prefix.as_deref(), Some("no"));
        assert_eq!(filter.field_equals, Some(("k".to_string(), "v".to_string())));
        assert_eq!(filter.limit, Some(3));
        assert_eq!(RecordFilter::all(), RecordFilter::default());
    }
}

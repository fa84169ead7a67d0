//! Read-only PostgreSQL executor.
//!
//! Every statement runs inside a `READ ONLY` transaction with a local
//! `statement_timeout`, and the transaction is always rolled back. A keyword
//! backstop refuses anything that is not a single `SELECT`/`WITH` statement
//! before it reaches the database.

use async_trait::async_trait;
use datagate_core::UpstreamConfig;
use datagate_runtime::{QueryExecutor, QueryResult};
use regex::Regex;
use sqlx::Row;
use sqlx::postgres::PgPoolOptions;
use std::sync::LazyLock;

static LEADING_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(select|with)\b").expect("leading keyword regex compiles")
});

static WRITE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(drop|delete|update|insert|alter|truncate|create|grant|revoke|merge|copy|vacuum|call)\b",
    )
    .expect("write keyword regex compiles")
});

#[derive(Debug, Clone, Copy)]
pub struct PostgresExecutorOptions {
    /// Rows fetched at most; one extra row is read to detect truncation.
    pub max_rows: usize,
    pub statement_timeout_ms: u64,
}

impl Default for PostgresExecutorOptions {
    fn default() -> Self {
        Self {
            max_rows: 500,
            statement_timeout_ms: 15_000,
        }
    }
}

pub struct PostgresExecutor {
    pool: sqlx::PgPool,
    options: PostgresExecutorOptions,
}

impl PostgresExecutor {
    pub async fn new(database_url: &str, max_connections: u32, options: PostgresExecutorOptions) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool, options })
    }

    /// Connect using the upstream section of the configuration.
    pub async fn connect(upstream: &UpstreamConfig, max_rows: usize) -> anyhow::Result<Self> {
        let options = PostgresExecutorOptions {
            max_rows,
            statement_timeout_ms: upstream.statement_timeout_ms,
        };
        let executor =
            Self::new(&upstream.connection_string(), upstream.max_connections, options).await?;
        tracing::info!(
            host = %upstream.host,
            database = %upstream.database,
            max_connections = upstream.max_connections,
            "connected to upstream database"
        );
        Ok(executor)
    }
}

/// Last line of defence: the gate has already accepted this SQL, but the
/// executor still refuses anything that is not a single read statement.
pub fn ensure_read_only(sql: &str) -> anyhow::Result<()> {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    if statement.is_empty() {
        anyhow::bail!("Refusing to execute: empty statement");
    }
    if !LEADING_KEYWORD_RE.is_match(statement) {
        anyhow::bail!("Refusing to execute: only SELECT or WITH statements are allowed");
    }
    if statement.contains(';') {
        anyhow::bail!("Refusing to execute: multiple statements");
    }
    if let Some(found) = WRITE_KEYWORD_RE.find(statement) {
        anyhow::bail!(
            "Refusing to execute: forbidden keyword '{}'",
            found.as_str().to_uppercase()
        );
    }
    Ok(())
}

/// Wrap `sql` so each row comes back as one JSON object, capped at `limit`.
fn wrap_as_json_rows(sql: &str, limit: usize) -> String {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    format!(
        "SELECT to_json(q) AS row FROM ({}) AS q LIMIT {}",
        statement, limit
    )
}

/// Split JSON objects into a column list and positional rows. Columns come
/// from the first object.
fn into_query_result(objects: Vec<serde_json::Value>, max_rows: usize) -> QueryResult {
    let columns: Vec<String> = match objects.first() {
        Some(serde_json::Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let rows = objects
        .iter()
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).cloned().unwrap_or(serde_json::Value::Null))
                .collect()
        })
        .collect();

    let mut result = QueryResult {
        columns,
        rows,
        truncated: false,
    };
    result.truncate(max_rows);
    result
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn execute_read_only(&self, sql: &str) -> anyhow::Result<QueryResult> {
        ensure_read_only(sql)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(format!("{}ms", self.options.statement_timeout_ms))
            .execute(&mut *tx)
            .await?;

        let wrapped = wrap_as_json_rows(sql, self.options.max_rows + 1);
        let fetched = sqlx::query(&wrapped).fetch_all(&mut *tx).await;
        tx.rollback().await?;

        let objects = fetched?
            .into_iter()
            .map(|r| r.try_get::<serde_json::Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;

        let result = into_query_result(objects, self.options.max_rows);
        tracing::debug!(
            rows = result.row_count(),
            truncated = result.truncated,
            "read-only query executed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn plain_select_and_cte_pass() {
        assert!(ensure_read_only("SELECT nom FROM clients").is_ok());
        assert!(ensure_read_only("  with t as (select 1) select * from t;").is_ok());
    }

    #[test]
    fn write_statements_are_refused() {
        for sql in [
            "DELETE FROM clients",
            "UPDATE clients SET nom = 'x'",
            "DROP TABLE clients",
            "INSERT INTO clients VALUES (1)",
        ] {
            assert!(ensure_read_only(sql).is_err(), "{sql}");
        }
    }

    #[test]
    fn write_keyword_inside_select_is_refused() {
        let err = ensure_read_only("WITH d AS (DELETE FROM clients RETURNING *) SELECT * FROM d")
            .unwrap_err();
        assert!(err.to_string().contains("DELETE"));
    }

    #[test]
    fn keyword_match_is_whole_word() {
        assert!(ensure_read_only("SELECT date_creation, updated_at FROM clients").is_ok());
    }

    #[test]
    fn stacked_statements_are_refused() {
        assert!(ensure_read_only("SELECT 1; SELECT 2").is_err());
        assert!(ensure_read_only("   ").is_err());
    }

    #[test]
    fn wrapping_strips_trailing_semicolon() {
        assert_eq!(
            wrap_as_json_rows("SELECT id FROM clients;", 11),
            "SELECT to_json(q) AS row FROM (SELECT id FROM clients) AS q LIMIT 11"
        );
    }

    #[test]
    fn objects_keep_column_order() {
        let objects = vec![
            json!({"ville": "Paris", "total": 3}),
            json!({"ville": "Lyon", "total": 1}),
        ];
        let result = into_query_result(objects, 10);

        assert_eq!(result.columns, vec!["ville", "total"]);
        assert_eq!(result.rows[1], vec![json!("Lyon"), json!(1)]);
        assert!(!result.truncated);
    }

    #[test]
    fn extra_row_marks_truncation() {
        let objects = (0..3).map(|i| json!({"id": i})).collect();
        let result = into_query_result(objects, 2);

        assert_eq!(result.row_count(), 2);
        assert!(result.truncated);
    }

    #[test]
    fn no_rows_means_no_columns() {
        let result = into_query_result(Vec::new(), 10);
        assert!(result.is_empty());
        assert!(result.columns.is_empty());
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Rows returned by a read-only query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Set when rows were dropped to respect the row cap.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep at most `max_rows` rows.
    pub fn truncate(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.truncated = true;
        }
    }

    /// Payload handed to the formatting stage.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "columns": self.columns,
            "rows": self.rows,
            "row_count": self.row_count(),
        });
        if self.truncated {
            value["truncated"] = serde_json::Value::Bool(true);
        }
        value
    }
}

/// Text generation service (a chat model).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Answer `input` under `instruction`. No retries, no streaming.
    async fn generate(&self, instruction: &str, input: &str) -> anyhow::Result<String>;
}

/// Read-only query service.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run one statement that must not modify anything.
    async fn execute_read_only(&self, sql: &str) -> anyhow::Result<QueryResult>;
}

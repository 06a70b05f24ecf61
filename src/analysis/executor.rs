//! The query-execution seam between the analysis engine and storage.

use anyhow::Result;

use super::query::AnalyticalQuery;

/// A result row: column name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Runs an [`AnalyticalQuery`] and returns its rows.
///
/// An `Err` means the backend could not run the query; an empty `Vec` means it
/// ran and matched nothing. Calls are blocking.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &AnalyticalQuery) -> Result<Vec<Row>>;
}

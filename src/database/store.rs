use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use super::error::{QueryIntent, StoreError};
use super::ids::IdFormat;
use super::schema::{ColumnDef, TableDescriptor};
use super::statement::{DeleteStatement, InsertStatement, UpdateStatement, WriteOutcome};
use super::value::Record;
use crate::filter::Filter;

/// Storage backend for the pagination engine and the record helpers.
///
/// Implementations execute typed statements; they never see free-form SQL.
/// Each call is one logical operation and holds at most one pooled
/// connection for its whole duration.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `page`, plus the row count of `count` when given.
    /// Both run on the same connection.
    async fn fetch_page(&self, page: &Filter, count: Option<&Filter>) -> Result<(Vec<Record>, Option<i64>), StoreError>;

    /// First row matching `filter`
    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError>;

    async fn insert(&self, stmt: &InsertStatement) -> Result<WriteOutcome, StoreError>;

    async fn update(&self, stmt: &UpdateStatement) -> Result<WriteOutcome, StoreError>;

    async fn delete(&self, stmt: &DeleteStatement) -> Result<WriteOutcome, StoreError>;

    /// Largest numeric suffix among `column` values that are `prefix`
    /// followed only by digits. `None` when no value qualifies.
    async fn max_id_suffix(
        &self,
        table: &'static TableDescriptor,
        column: &'static ColumnDef,
        prefix: &str,
    ) -> Result<Option<i64>, StoreError>;

    /// Allocate the next id and insert `stmt` with it, serialized against
    /// other callers allocating ids on the same table.
    async fn insert_with_generated_id(
        &self,
        stmt: InsertStatement,
        column: &'static ColumnDef,
        format: &IdFormat,
    ) -> Result<String, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Statement deadline plus slow-operation reporting
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub timeout: Duration,
    pub slow_threshold: Option<Duration>,
}

impl Deadline {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, slow_threshold: None }
    }

    pub fn warn_after(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Run `fut` to completion or fail with `StoreError::Timeout`. Dropping
    /// the future on expiry releases any connection it holds.
    pub async fn run<T, F>(&self, table: &'static str, intent: QueryIntent, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.run_from(Instant::now(), table, intent, fut).await
    }

    /// Like [`Deadline::run`] for a later stage of an operation begun at
    /// `started`. All stages share one budget; expiry names the stage's intent.
    pub async fn run_from<T, F>(
        &self,
        started: Instant,
        table: &'static str,
        intent: QueryIntent,
        fut: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let remaining = self.timeout.saturating_sub(started.elapsed());
        let result = tokio::time::timeout(remaining, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                table,
                intent,
                timeout_ms: self.timeout.as_millis() as u64,
            })?;

        if let Some(threshold) = self.slow_threshold {
            let elapsed = started.elapsed();
            if elapsed > threshold {
                warn!(table, %intent, elapsed_ms = elapsed.as_millis() as u64, "Slow store operation");
            }
        }
        result
    }
}

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::debug;

use super::error::{QueryIntent, StoreError};
use super::ids::IdFormat;
use super::schema::{ColumnDef, TableDescriptor};
use super::statement::{DeleteStatement, InsertStatement, UpdateStatement, WriteOutcome};
use super::store::{Deadline, RecordStore};
use super::value::{FieldValue, Record};
use crate::config::DatabaseConfig;
use crate::filter::{Filter, SqlResult};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed [`RecordStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    deadline: Deadline,
    log_queries: bool,
}

impl PgStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        let mut deadline = Deadline::new(Duration::from_millis(config.statement_timeout_ms));
        if config.enable_slow_query_warning {
            deadline = deadline.warn_after(Duration::from_millis(config.slow_query_threshold_ms));
        }
        Self {
            pool,
            deadline,
            log_queries: config.enable_query_logging,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn build_query<'q>(&self, sql: &'q SqlResult) -> PgQuery<'q> {
        if self.log_queries {
            debug!(query = %sql.query, params = sql.params.len(), "Executing query");
        }
        let mut q = sqlx::query(&sql.query);
        for p in &sql.params {
            q = bind_param(q, p);
        }
        q
    }

    async fn execute_write(&self, table: &'static str, intent: QueryIntent, sql: SqlResult) -> Result<WriteOutcome, StoreError> {
        self.deadline
            .run(table, intent, async {
                let result = self
                    .build_query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::query(table, intent, e))?;
                Ok(WriteOutcome::from_rows(result.rows_affected()))
            })
            .await
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn fetch_page(&self, page: &Filter, count: Option<&Filter>) -> Result<(Vec<Record>, Option<i64>), StoreError> {
        let table = page.table().name;
        let select_sql = page.to_sql();
        let count_sql = count.map(Filter::to_count_sql);

        let started = Instant::now();
        // One connection for both statements
        let (mut conn, records) = self
            .deadline
            .run_from(started, table, QueryIntent::Select, async {
                let mut conn = self
                    .pool
                    .acquire()
                    .await
                    .map_err(|e| StoreError::query(table, QueryIntent::Select, e))?;

                let rows = self
                    .build_query(&select_sql)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| StoreError::query(table, QueryIntent::Select, e))?;
                let records = rows
                    .iter()
                    .map(|row| decode_row(table, row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((conn, records))
            })
            .await?;

        let Some(sql) = count_sql else {
            return Ok((records, None));
        };
        let total = self
            .deadline
            .run_from(started, table, QueryIntent::Count, async {
                let row = self
                    .build_query(&sql)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| StoreError::query(table, QueryIntent::Count, e))?;
                let count: i64 = row
                    .try_get("count")
                    .map_err(|e| StoreError::query(table, QueryIntent::Count, e))?;
                Ok(count)
            })
            .await?;

        Ok((records, Some(total)))
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError> {
        let table = filter.table().name;
        let mut filter = filter.clone();
        filter.limit(1)?;
        let sql = filter.to_sql();

        self.deadline
            .run(table, QueryIntent::Select, async {
                let row = self
                    .build_query(&sql)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| StoreError::query(table, QueryIntent::Select, e))?;
                row.map(|r| decode_row(table, &r)).transpose()
            })
            .await
    }

    async fn insert(&self, stmt: &InsertStatement) -> Result<WriteOutcome, StoreError> {
        let table = stmt.table.name;
        let sql = stmt.to_sql();

        self.deadline
            .run(table, QueryIntent::Insert, async {
                let result = self
                    .build_query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| insert_error(stmt, e))?;
                Ok(WriteOutcome::from_rows(result.rows_affected()))
            })
            .await
    }

    async fn update(&self, stmt: &UpdateStatement) -> Result<WriteOutcome, StoreError> {
        self.execute_write(stmt.table.name, QueryIntent::Update, stmt.to_sql()).await
    }

    async fn delete(&self, stmt: &DeleteStatement) -> Result<WriteOutcome, StoreError> {
        self.execute_write(stmt.table.name, QueryIntent::Delete, stmt.to_sql()).await
    }

    async fn max_id_suffix(
        &self,
        table: &'static TableDescriptor,
        column: &'static ColumnDef,
        prefix: &str,
    ) -> Result<Option<i64>, StoreError> {
        let sql = IdFormat::new(prefix, 1)?.max_suffix_sql(table.name, column.name);

        self.deadline
            .run(table.name, QueryIntent::GenerateId, async {
                let row = self
                    .build_query(&sql)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| StoreError::query(table.name, QueryIntent::GenerateId, e))?;
                row.try_get::<Option<i64>, _>("max_suffix")
                    .map_err(|e| StoreError::query(table.name, QueryIntent::GenerateId, e))
            })
            .await
    }

    async fn insert_with_generated_id(
        &self,
        stmt: InsertStatement,
        column: &'static ColumnDef,
        format: &IdFormat,
    ) -> Result<String, StoreError> {
        let table = stmt.table.name;
        let max_sql = format.max_suffix_sql(table, column.name);
        // SHARE ROW EXCLUSIVE conflicts with itself, so id allocation on a
        // table is serialized while plain reads continue.
        let lock_sql = format!("LOCK TABLE \"{}\" IN SHARE ROW EXCLUSIVE MODE", table);

        self.deadline
            .run(table, QueryIntent::GenerateId, async {
                let gen_err = |e| StoreError::query(table, QueryIntent::GenerateId, e);

                let mut tx = self.pool.begin().await.map_err(gen_err)?;
                sqlx::query(&lock_sql).execute(&mut *tx).await.map_err(gen_err)?;

                let row = self.build_query(&max_sql).fetch_one(&mut *tx).await.map_err(gen_err)?;
                let max: Option<i64> = row.try_get("max_suffix").map_err(gen_err)?;
                let id = format.next_after(max);

                let stmt = stmt.with_value(column, FieldValue::Bound(Value::String(id.clone())));
                let insert_sql = stmt.to_sql();
                self.build_query(&insert_sql)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| insert_error(&stmt, e))?;

                tx.commit().await.map_err(gen_err)?;
                Ok(id)
            })
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.deadline
            .run("pg_catalog", QueryIntent::Ping, async {
                sqlx::query("SELECT 1")
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::query("pg_catalog", QueryIntent::Ping, e))?;
                Ok(())
            })
            .await
    }
}

fn bind_param<'q>(q: PgQuery<'q>, v: &'q Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Values are coerced to scalars before they reach a statement
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}

fn decode_row(table: &'static str, row: &PgRow) -> Result<Record, StoreError> {
    let value: Value = row
        .try_get("row")
        .map_err(|e| StoreError::query(table, QueryIntent::Select, e))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::query(
            table,
            QueryIntent::Select,
            sqlx::Error::Decode(format!("expected a JSON object row, got {}", other).into()),
        )),
    }
}

fn insert_error(stmt: &InsertStatement, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let id = stmt
                .id_value()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .unwrap_or_default();
            return StoreError::DuplicateId { table: stmt.table.name, id };
        }
    }
    StoreError::query(stmt.table.name, QueryIntent::Insert, err)
}

//! Table-agnostic single-row helpers used by the route handlers.

use serde_json::Value;
use tracing::debug;

use super::error::StoreError;
use super::schema::TableId;
use super::statement::{DeleteStatement, InsertStatement, UpdateStatement, WriteOutcome};
use super::store::RecordStore;
use super::value::{RawExpr, Record, RecordData};
use crate::filter::Filter;

const UPDATED_AT: &str = "updated_at";

#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    /// Append `updated_at = NOW()`
    pub auto_timestamp: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self { auto_timestamp: true }
    }
}

/// The row whose `id_column` equals `id`, projected to `select` (or the
/// table's default columns when empty). `None` when no row matches.
pub async fn find_by_id(
    store: &dyn RecordStore,
    table: TableId,
    id_column: &str,
    id: &Value,
    select: &[&str],
) -> Result<Option<Record>, StoreError> {
    let mut filter = Filter::new(table.descriptor());
    if !select.is_empty() {
        filter.select(select)?;
    }
    filter.where_eq(id_column, id)?;
    store.find_one(&filter).await
}

pub async fn insert_record(store: &dyn RecordStore, table: TableId, data: RecordData) -> Result<WriteOutcome, StoreError> {
    let stmt = InsertStatement::new(table.descriptor(), data)?;
    store.insert(&stmt).await
}

/// Set exactly the columns in `data` on rows where `where_column = where_value`
pub async fn update_record(
    store: &dyn RecordStore,
    table: TableId,
    data: RecordData,
    where_column: &str,
    where_value: &Value,
) -> Result<WriteOutcome, StoreError> {
    let stmt = UpdateStatement::new(table.descriptor(), data, where_column, where_value)?;
    store.update(&stmt).await
}

/// Sparse update: `null` values are dropped, and `updated_at = NOW()` is
/// appended when `options.auto_timestamp` is set.
///
/// Fails with `EmptyUpdate` when no caller-supplied column survives, so a
/// body of only nulls never turns into a timestamp-only write.
pub async fn build_dynamic_update(
    store: &dyn RecordStore,
    table: TableId,
    data: RecordData,
    where_column: &str,
    where_value: &Value,
    options: UpdateOptions,
) -> Result<WriteOutcome, StoreError> {
    let descriptor = table.descriptor();
    let mut data = data.without_nulls();
    if data.is_empty() {
        return Err(StoreError::EmptyUpdate(descriptor.name));
    }
    if options.auto_timestamp {
        data = data.raw(UPDATED_AT, RawExpr::Now);
    }

    debug!(table = descriptor.name, columns = data.len(), "Dynamic update");
    update_record(store, table, data, where_column, where_value).await
}

pub async fn delete_by_id(
    store: &dyn RecordStore,
    table: TableId,
    id_column: &str,
    id: &Value,
) -> Result<WriteOutcome, StoreError> {
    let stmt = DeleteStatement::new(table.descriptor(), id_column, id)?;
    store.delete(&stmt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use serde_json::json;

    async fn store_with_user() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(TableId::Users, vec![json!({
                "id": 1, "nama": "Ayu", "email": "ayu@example.com", "role": "mine_planner",
                "token": "t", "updated_at": null
            })])
            .await;
        store
    }

    #[tokio::test]
    async fn find_by_id_projects_and_reports_missing() {
        let store = store_with_user().await;
        let row = find_by_id(&store, TableId::Users, "id", &json!("1"), &[]).await.unwrap().unwrap();
        assert_eq!(row, json!({ "id": 1, "nama": "Ayu", "email": "ayu@example.com", "role": "mine_planner" })
            .as_object().cloned().unwrap());

        let row = find_by_id(&store, TableId::Users, "id", &json!(1), &["token"]).await.unwrap().unwrap();
        assert_eq!(row["token"], json!("t"));

        assert!(find_by_id(&store, TableId::Users, "id", &json!(2), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_evaluates_raw_expressions() {
        let store = MemoryStore::new();
        let data = RecordData::new()
            .set("constraint_id", json!("C0001"))
            .set("mine_id", json!("M01"))
            .raw("update_date", RawExpr::CurrentDate);
        let outcome = insert_record(&store, TableId::ProductionConstraints, data).await.unwrap();
        assert_eq!(outcome, WriteOutcome { success: true, affected_rows: 1 });

        let rows = store.rows(TableId::ProductionConstraints).await;
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(rows[0]["update_date"], json!(today));
    }

    #[tokio::test]
    async fn sparse_update_is_idempotent() {
        let store = store_with_user().await;
        let data = || RecordData::new().set("nama", json!("Ayu Lestari")).set("email", Value::Null);

        let first = build_dynamic_update(&store, TableId::Users, data(), "id", &json!(1), UpdateOptions::default())
            .await
            .unwrap();
        let after_first = find_by_id(&store, TableId::Users, "id", &json!(1), &[]).await.unwrap();
        let second = build_dynamic_update(&store, TableId::Users, data(), "id", &json!(1), UpdateOptions::default())
            .await
            .unwrap();
        let after_second = find_by_id(&store, TableId::Users, "id", &json!(1), &[]).await.unwrap();

        assert!(first.success && second.success);
        assert_eq!(after_first, after_second);
        let row = after_second.unwrap();
        assert_eq!(row["nama"], json!("Ayu Lestari"));
        assert_eq!(row["email"], json!("ayu@example.com"));

        let stored = store.rows(TableId::Users).await;
        assert!(stored[0]["updated_at"].is_string());
    }

    #[tokio::test]
    async fn update_of_only_nulls_is_rejected() {
        let store = store_with_user().await;
        let data = RecordData::new().set("nama", Value::Null);
        let err = build_dynamic_update(&store, TableId::Users, data, "id", &json!(1), UpdateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyUpdate("users")));
    }

    #[tokio::test]
    async fn update_without_timestamp_on_tables_lacking_the_column() {
        let store = MemoryStore::new();
        store.seed(TableId::Roads, vec![json!({ "road_id": "R1", "condition_level": "good" })]).await;
        let data = RecordData::new().set("condition_level", json!("poor"));

        let err = build_dynamic_update(&store, TableId::Roads, data.clone(), "road_id", &json!("R1"), UpdateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { column, .. } if column == "updated_at"));

        let outcome = build_dynamic_update(
            &store,
            TableId::Roads,
            data,
            "road_id",
            &json!("R1"),
            UpdateOptions { auto_timestamp: false },
        )
        .await
        .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn missing_rows_are_not_errors() {
        let store = MemoryStore::new();
        let data = RecordData::new().set("status", json!("closed"));
        let outcome = update_record(&store, TableId::Mines, data, "mine_id", &json!("M99")).await.unwrap();
        assert_eq!(outcome, WriteOutcome { success: false, affected_rows: 0 });

        let outcome = delete_by_id(&store, TableId::Mines, "mine_id", &json!("M99")).await.unwrap();
        assert!(!outcome.success);
    }
}

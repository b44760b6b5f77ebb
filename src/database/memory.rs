use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::ids::IdFormat;
use super::schema::{ColumnDef, TableDescriptor, TableId};
use super::statement::{DeleteStatement, InsertStatement, UpdateStatement, WriteOutcome};
use super::store::RecordStore;
use super::value::{compare_values, FieldValue, Record};
use crate::filter::filter_where::FilterWhere;
use crate::filter::Filter;

/// In-process record store evaluating the same typed statements as
/// [`PgStore`](super::postgres::PgStore). Used by tests and local runs
/// without a database.
///
/// Primary keys are enforced: inserting an existing id fails with
/// `DuplicateId`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rows as-is, bypassing validation. Non-object values are skipped.
    pub async fn seed(&self, table: TableId, rows: Vec<Value>) {
        let mut tables = self.tables.write().await;
        let target = tables.entry(table.table_name()).or_default();
        target.extend(rows.into_iter().filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Every stored row of `table`, in insertion order
    pub async fn rows(&self, table: TableId) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(table.table_name())
            .cloned()
            .unwrap_or_default()
    }

    fn check_unique(table: &'static TableDescriptor, rows: &[Record], stmt: &InsertStatement) -> Result<(), StoreError> {
        let Some(id) = stmt.id_value() else {
            return Ok(());
        };
        let taken = rows.iter().any(|r| {
            r.get(table.id_column)
                .and_then(|existing| compare_values(existing, id))
                .is_some_and(|o| o.is_eq())
        });
        if taken {
            return Err(StoreError::DuplicateId {
                table: table.name,
                id: id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()),
            });
        }
        Ok(())
    }

    fn max_suffix(rows: &[Record], column: &ColumnDef, format: &IdFormat) -> Option<i64> {
        rows.iter()
            .filter_map(|r| r.get(column.name)?.as_str())
            .filter_map(|id| format.suffix_of(id))
            .max()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_page(&self, page: &Filter, count: Option<&Filter>) -> Result<(Vec<Record>, Option<i64>), StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.get(page.table().name).map(Vec::as_slice).unwrap_or(&[]);

        let records = page.apply(rows);
        let total = count.map(|c| rows.iter().filter(|r| c.matches(r)).count() as i64);
        Ok((records, total))
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.get(filter.table().name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(filter.apply(rows).into_iter().next())
    }

    async fn insert(&self, stmt: &InsertStatement) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(stmt.table.name).or_default();
        Self::check_unique(stmt.table, rows, stmt)?;
        rows.push(stmt.to_record());
        Ok(WriteOutcome::from_rows(1))
    }

    async fn update(&self, stmt: &UpdateStatement) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let mut affected = 0;
        if let Some(rows) = tables.get_mut(stmt.table.name) {
            for row in rows.iter_mut() {
                if FilterWhere::matches(std::slice::from_ref(&stmt.condition), row) {
                    stmt.apply_to(row);
                    affected += 1;
                }
            }
        }
        Ok(WriteOutcome::from_rows(affected))
    }

    async fn delete(&self, stmt: &DeleteStatement) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let mut affected = 0;
        if let Some(rows) = tables.get_mut(stmt.table.name) {
            let before = rows.len();
            rows.retain(|row| !FilterWhere::matches(std::slice::from_ref(&stmt.condition), row));
            affected = (before - rows.len()) as u64;
        }
        Ok(WriteOutcome::from_rows(affected))
    }

    async fn max_id_suffix(
        &self,
        table: &'static TableDescriptor,
        column: &'static ColumnDef,
        prefix: &str,
    ) -> Result<Option<i64>, StoreError> {
        // Width does not affect parsing
        let format = IdFormat::new(prefix, 1)?;
        let tables = self.tables.read().await;
        let rows = tables.get(table.name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::max_suffix(rows, column, &format))
    }

    async fn insert_with_generated_id(
        &self,
        stmt: InsertStatement,
        column: &'static ColumnDef,
        format: &IdFormat,
    ) -> Result<String, StoreError> {
        // The write lock is held from reading the maximum through the insert
        let mut tables = self.tables.write().await;
        let rows = tables.entry(stmt.table.name).or_default();

        let id = format.next_after(Self::max_suffix(rows, column, format));
        let stmt = stmt.with_value(column, FieldValue::Bound(Value::String(id.clone())));
        Self::check_unique(stmt.table, rows, &stmt)?;
        rows.push(stmt.to_record());
        Ok(id)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::RecordData;
    use serde_json::json;

    #[tokio::test]
    async fn update_and_delete_report_affected_rows() {
        let store = MemoryStore::new();
        store
            .seed(TableId::Roads, vec![
                json!({ "road_id": "R1", "condition_level": "good" }),
                json!({ "road_id": "R2", "condition_level": "poor" }),
            ])
            .await;
        let table = TableId::Roads.descriptor();

        let stmt = UpdateStatement::new(table, RecordData::new().set("condition_level", json!("fair")), "road_id", &json!("R2")).unwrap();
        assert_eq!(store.update(&stmt).await.unwrap(), WriteOutcome { success: true, affected_rows: 1 });

        let stmt = UpdateStatement::new(table, RecordData::new().set("condition_level", json!("fair")), "road_id", &json!("R9")).unwrap();
        assert!(!store.update(&stmt).await.unwrap().success);

        let stmt = DeleteStatement::new(table, "road_id", &json!("R1")).unwrap();
        assert_eq!(store.delete(&stmt).await.unwrap().affected_rows, 1);
        assert_eq!(store.rows(TableId::Roads).await.len(), 1);
        assert_eq!(store.rows(TableId::Roads).await[0]["condition_level"], json!("fair"));
    }

    #[tokio::test]
    async fn integer_keys_are_unique() {
        let store = MemoryStore::new();
        store.seed(TableId::Users, vec![json!({ "id": 1, "nama": "Ayu" })]).await;
        let stmt = InsertStatement::new(TableId::Users.descriptor(), RecordData::new().set("id", json!("1"))).unwrap();
        assert!(matches!(store.insert(&stmt).await, Err(StoreError::DuplicateId { .. })));
    }
}

use std::cmp::Ordering;

use serde_json::Value;

use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterOrderInfo, SortDirection, SqlResult};
use crate::database::error::StoreError;
use crate::database::schema::{ColumnDef, TableDescriptor};
use crate::database::value::Record;

/// A typed SELECT over one catalog table.
///
/// The same filter renders to SQL for Postgres and evaluates in-process for
/// the memory store, so both stores agree on membership and order.
#[derive(Debug, Clone)]
pub struct Filter {
    table: &'static TableDescriptor,
    select_columns: Vec<&'static ColumnDef>,
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
}

impl Filter {
    /// New filter selecting the table's default projection
    pub fn new(table: &'static TableDescriptor) -> Self {
        Self {
            table,
            select_columns: table.selected(),
            conditions: vec![],
            order_data: vec![],
            limit: None,
        }
    }

    pub fn table(&self) -> &'static TableDescriptor {
        self.table
    }

    pub fn select(&mut self, columns: &[&str]) -> Result<&mut Self, StoreError> {
        self.select_columns = self.table.columns_named(columns)?;
        Ok(self)
    }

    /// Coerce `value` to the column's kind and add `column = value`
    pub fn where_eq(&mut self, column: &str, value: &Value) -> Result<&mut Self, StoreError> {
        let col = self.table.column(column)?;
        let value = col.kind.coerce(col.name, value)?;
        self.conditions.push(Condition::Eq(col, value));
        Ok(self)
    }

    pub fn where_not_null(&mut self, column: &str) -> Result<&mut Self, StoreError> {
        let col = self.table.column(column)?;
        self.conditions.push(Condition::NotNull(col));
        Ok(self)
    }

    pub fn where_between(&mut self, column: &str, low: &Value, high: &Value) -> Result<&mut Self, StoreError> {
        let col = self.table.column(column)?;
        let low = col.kind.coerce(col.name, low)?;
        let high = col.kind.coerce(col.name, high)?;
        self.conditions.push(Condition::Between(col, low, high));
        Ok(self)
    }

    pub fn where_before(&mut self, column: &str, value: &Value) -> Result<&mut Self, StoreError> {
        let col = self.table.column(column)?;
        let value = col.kind.coerce(col.name, value)?;
        self.conditions.push(Condition::Before(col, value));
        Ok(self)
    }

    pub fn where_before_composite(
        &mut self,
        primary: &str,
        primary_value: &Value,
        secondary: &str,
        secondary_value: &Value,
    ) -> Result<&mut Self, StoreError> {
        let primary = self.table.column(primary)?;
        let secondary = self.table.column(secondary)?;
        self.conditions.push(Condition::BeforeComposite {
            primary,
            primary_value: primary.kind.coerce(primary.name, primary_value)?,
            secondary,
            secondary_value: secondary.kind.coerce(secondary.name, secondary_value)?,
        });
        Ok(self)
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> Result<&mut Self, StoreError> {
        let col = self.table.column(column)?;
        self.order_data.push(FilterOrderInfo { column: col, sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64) -> Result<&mut Self, StoreError> {
        if limit < 0 {
            return Err(StoreError::InvalidLimit(limit));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Rows come back as a single JSON object column named `row`, which keeps
    /// column types intact and lets one decoder serve every table.
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();

        let query = [
            format!("SELECT {} AS row", self.build_select_clause()),
            format!("FROM \"{}\"", self.table.name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table.name, where_clause),
            params,
        }
    }

    fn build_select_clause(&self) -> String {
        let pairs: Vec<String> = self
            .select_columns
            .iter()
            .map(|c| format!("'{}', {}", c.name, c.quoted()))
            .collect();
        format!("json_build_object({})", pairs.join(", "))
    }

    pub fn matches(&self, record: &Record) -> bool {
        FilterWhere::matches(&self.conditions, record)
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        FilterOrder::compare(&self.order_data, a, b)
    }

    /// Reduce a full record to the selected columns; absent columns read as null
    pub fn project(&self, record: &Record) -> Record {
        self.select_columns
            .iter()
            .map(|c| (c.name.to_string(), record.get(c.name).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Evaluate the filter over an in-memory row set: filter, sort, limit
    /// and project.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
        let mut matched: Vec<&Record> = rows.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        let take = self.limit.map(|l| l as usize).unwrap_or(matched.len());
        matched.into_iter().take(take).map(|r| self.project(r)).collect()
    }
}

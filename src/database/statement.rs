//! INSERT / UPDATE / DELETE statements over catalog tables.
//!
//! Statements are constructed only through validating constructors, so by
//! the time a store sees one every identifier is in the catalog and every
//! bound value has been coerced to its column's kind.

use serde_json::Value;

use super::error::StoreError;
use super::schema::{ColumnDef, TableDescriptor};
use super::value::{FieldValue, Record, RecordData};
use crate::filter::filter_where::FilterWhere;
use crate::filter::{Condition, SqlResult};

/// Result of a write: `success` is `affected_rows > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub success: bool,
    pub affected_rows: u64,
}

impl WriteOutcome {
    pub fn from_rows(affected_rows: u64) -> Self {
        Self { success: affected_rows > 0, affected_rows }
    }
}

type Fields = Vec<(&'static ColumnDef, FieldValue)>;

#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: &'static TableDescriptor,
    pub fields: Fields,
}

impl InsertStatement {
    pub fn new(table: &'static TableDescriptor, data: RecordData) -> Result<Self, StoreError> {
        if data.is_empty() {
            return Err(StoreError::EmptyUpdate(table.name));
        }
        Ok(Self { table, fields: data.resolve(table)? })
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut params = Vec::new();
        let mut columns = Vec::with_capacity(self.fields.len());
        let mut values = Vec::with_capacity(self.fields.len());

        for (col, value) in &self.fields {
            columns.push(col.quoted());
            values.push(render_value(col, value, &mut params));
        }

        SqlResult {
            query: format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                self.table.name,
                columns.join(", "),
                values.join(", ")
            ),
            params,
        }
    }

    /// Set `column`, replacing any value it already has. The value is taken
    /// as given; callers pass values already shaped for the column.
    pub fn with_value(mut self, column: &'static ColumnDef, value: FieldValue) -> Self {
        self.fields.retain(|(c, _)| c.name != column.name);
        self.fields.insert(0, (column, value));
        self
    }

    /// The row as the memory store keeps it, raw expressions evaluated
    pub fn to_record(&self) -> Record {
        self.fields
            .iter()
            .map(|(col, value)| (col.name.to_string(), evaluate(value)))
            .collect()
    }

    pub fn id_value(&self) -> Option<&Value> {
        self.fields.iter().find_map(|(col, value)| match value {
            FieldValue::Bound(v) if col.name == self.table.id_column => Some(v),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: &'static TableDescriptor,
    pub fields: Fields,
    pub condition: Condition,
}

impl UpdateStatement {
    pub fn new(
        table: &'static TableDescriptor,
        data: RecordData,
        where_column: &str,
        where_value: &Value,
    ) -> Result<Self, StoreError> {
        if data.is_empty() {
            return Err(StoreError::EmptyUpdate(table.name));
        }
        Ok(Self {
            table,
            fields: data.resolve(table)?,
            condition: eq_condition(table, where_column, where_value)?,
        })
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut params = Vec::new();
        let assignments: Vec<String> = self
            .fields
            .iter()
            .map(|(col, value)| {
                format!("{} = {}", col.quoted(), render_value(col, value, &mut params))
            })
            .collect();

        let (where_clause, where_params) =
            FilterWhere::generate(std::slice::from_ref(&self.condition), params.len());
        params.extend(where_params);

        SqlResult {
            query: format!(
                "UPDATE \"{}\" SET {} WHERE {}",
                self.table.name,
                assignments.join(", "),
                where_clause
            ),
            params,
        }
    }

    /// Apply the assignments to an in-memory record
    pub fn apply_to(&self, record: &mut Record) {
        for (col, value) in &self.fields {
            record.insert(col.name.to_string(), evaluate(value));
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub table: &'static TableDescriptor,
    pub condition: Condition,
}

impl DeleteStatement {
    pub fn new(table: &'static TableDescriptor, id_column: &str, id: &Value) -> Result<Self, StoreError> {
        Ok(Self { table, condition: eq_condition(table, id_column, id)? })
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(std::slice::from_ref(&self.condition), 0);
        SqlResult {
            query: format!("DELETE FROM \"{}\" WHERE {}", self.table.name, where_clause),
            params,
        }
    }
}

fn eq_condition(table: &'static TableDescriptor, column: &str, value: &Value) -> Result<Condition, StoreError> {
    let col = table.column(column)?;
    Ok(Condition::Eq(col, col.kind.coerce(col.name, value)?))
}

fn render_value(col: &ColumnDef, value: &FieldValue, params: &mut Vec<Value>) -> String {
    match value {
        FieldValue::Raw(expr) => expr.as_sql().to_string(),
        FieldValue::Bound(v) => {
            params.push(v.clone());
            format!("${}::{}", params.len(), col.kind.sql_type())
        }
    }
}

fn evaluate(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bound(v) => v.clone(),
        FieldValue::Raw(expr) => expr.evaluate(),
    }
}

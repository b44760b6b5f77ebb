use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::StoreError;
use super::schema::{ColumnDef, TableDescriptor};

/// A row as returned by the store: column name to JSON scalar
pub type Record = Map<String, Value>;

/// SQL expressions that may be written verbatim into a statement.
///
/// Anything not listed here is bound as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawExpr {
    CurrentDate,
    Now,
}

impl RawExpr {
    pub fn as_sql(&self) -> &'static str {
        match self {
            RawExpr::CurrentDate => "CURRENT_DATE",
            RawExpr::Now => "NOW()",
        }
    }

    /// What the expression evaluates to when no database is involved
    pub fn evaluate(&self) -> Value {
        match self {
            RawExpr::CurrentDate => {
                Value::String(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string())
            }
            RawExpr::Now => Value::String(
                chrono::Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bound(Value),
    Raw(RawExpr),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Bound(value)
    }
}

impl From<RawExpr> for FieldValue {
    fn from(expr: RawExpr) -> Self {
        FieldValue::Raw(expr)
    }
}

/// Ordered column assignments for an insert or update.
///
/// Columns keep insertion order so rendered statements are deterministic.
/// Setting a column twice replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordData {
    fields: Vec<(String, FieldValue)>,
}

impl RecordData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column.into(), value.into());
        self
    }

    pub fn raw(self, column: impl Into<String>, expr: RawExpr) -> Self {
        self.set(column, FieldValue::Raw(expr))
    }

    pub fn insert(&mut self, column: String, value: FieldValue) {
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Build from a JSON object body. Every key becomes a bound value.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut data = Self::new();
        for (k, v) in object {
            data.insert(k.clone(), FieldValue::Bound(v.clone()));
        }
        data
    }

    pub fn remove(&mut self, column: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|(c, _)| c == column)?;
        Some(self.fields.remove(pos).1)
    }

    /// Drop bound `null` values; raw expressions are kept
    pub fn without_nulls(mut self) -> Self {
        self.fields
            .retain(|(_, v)| !matches!(v, FieldValue::Bound(Value::Null)));
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Resolve every column against the table and coerce bound values to
    /// the column's kind.
    pub fn resolve(self, table: &TableDescriptor) -> Result<Vec<(&'static ColumnDef, FieldValue)>, StoreError> {
        self.fields
            .into_iter()
            .map(|(column, value)| {
                let def = table.column(&column)?;
                let value = match value {
                    FieldValue::Bound(v) => FieldValue::Bound(def.kind.coerce(def.name, &v)?),
                    raw => raw,
                };
                Ok((def, value))
            })
            .collect()
    }
}

/// Order two JSON scalars the way the store orders the column values they
/// came from. Values of different types do not compare.
///
/// Dates and timestamps are ISO strings, so lexical order matches
/// chronological order.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::TableId;
    use serde_json::json;

    #[test]
    fn set_replaces_existing_column() {
        let data = RecordData::new().set("brand", json!("Komatsu")).set("brand", json!("CAT"));
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("brand"), Some(&FieldValue::Bound(json!("CAT"))));
    }

    #[test]
    fn without_nulls_keeps_raw_expressions() {
        let data = RecordData::new()
            .set("remarks", Value::Null)
            .set("status", json!("active"))
            .raw("update_date", RawExpr::CurrentDate)
            .without_nulls();
        let columns: Vec<&str> = data.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["status", "update_date"]);
    }

    #[test]
    fn resolve_coerces_and_rejects_unknown_columns() {
        let table = TableId::Equipment.descriptor();
        let fields = RecordData::new()
            .set("base_capacity_ton", json!("250"))
            .resolve(table)
            .unwrap();
        assert_eq!(fields[0].0.name, "base_capacity_ton");
        assert_eq!(fields[0].1, FieldValue::Bound(json!("250")));

        let err = RecordData::new().set("password", json!("x")).resolve(table).unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[test]
    fn compares_like_the_store() {
        assert_eq!(compare_values(&json!("2025-01-09"), &json!("2025-01-10")), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(10), &json!(9)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("W10"), &json!("W9")), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
    }
}

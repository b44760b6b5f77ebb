use std::cmp::Ordering;

use serde_json::Value;

use super::types::Condition;
use crate::database::schema::ColumnDef;
use crate::database::value::{compare_values, Record};

/// Renders conditions to a parameterized WHERE clause, and evaluates the
/// same conditions against in-memory records.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render `conditions` joined with AND. Placeholders start after
    /// `starting_param_index`. An empty list renders as `1=1`.
    pub fn generate(conditions: &[Condition], starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let parts: Vec<String> = conditions
            .iter()
            .map(|c| filter_where.build_sql_condition(c))
            .collect();
        let where_clause = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::NotNull(col) => format!("{} IS NOT NULL", col.quoted()),
            Condition::Eq(col, value) => {
                if value.is_null() {
                    format!("{} IS NULL", col.quoted())
                } else {
                    format!("{} = {}", col.quoted(), self.param(col, value.clone()))
                }
            }
            Condition::Between(col, low, high) => format!(
                "{} BETWEEN {} AND {}",
                col.quoted(),
                self.param(col, low.clone()),
                self.param(col, high.clone())
            ),
            Condition::Before(col, value) => {
                format!("{} < {}", col.ordering_expr(), self.param(col, value.clone()))
            }
            Condition::BeforeComposite { primary, primary_value, secondary, secondary_value } => {
                let p = self.param(primary, primary_value.clone());
                let s = self.param(secondary, secondary_value.clone());
                format!(
                    "({pk} < {p} OR ({pk} = {p} AND {sk} < {s}))",
                    pk = primary.ordering_expr(),
                    sk = secondary.ordering_expr(),
                )
            }
        }
    }

    fn param(&mut self, column: &ColumnDef, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::{}", self.param_index, column.kind.sql_type())
    }

    /// True when `record` satisfies every condition, with SQL NULL semantics:
    /// any comparison against a missing or null value fails.
    pub fn matches(conditions: &[Condition], record: &Record) -> bool {
        conditions.iter().all(|c| Self::matches_one(c, record))
    }

    fn matches_one(condition: &Condition, record: &Record) -> bool {
        match condition {
            Condition::NotNull(col) => field(record, col).is_some(),
            Condition::Eq(col, value) if value.is_null() => field(record, col).is_none(),
            Condition::Eq(col, value) => compare(record, col, value) == Some(Ordering::Equal),
            Condition::Between(col, low, high) => {
                matches!(compare(record, col, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(record, col, high), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::Before(col, value) => compare(record, col, value) == Some(Ordering::Less),
            Condition::BeforeComposite { primary, primary_value, secondary, secondary_value } => {
                match compare(record, primary, primary_value) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => {
                        compare(record, secondary, secondary_value) == Some(Ordering::Less)
                    }
                    _ => false,
                }
            }
        }
    }
}

fn field<'r>(record: &'r Record, column: &ColumnDef) -> Option<&'r Value> {
    record.get(column.name).filter(|v| !v.is_null())
}

fn compare(record: &Record, column: &ColumnDef, value: &Value) -> Option<Ordering> {
    field(record, column).and_then(|v| compare_values(v, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::TableId;
    use serde_json::json;

    fn col(table: TableId, name: &str) -> &'static ColumnDef {
        table.descriptor().column(name).unwrap()
    }

    #[test]
    fn renders_casts_and_param_indexes() {
        let date = col(TableId::EffectiveCapacity, "week_start");
        let conditions = vec![
            Condition::NotNull(date),
            Condition::Between(date, json!("2025-01-01"), json!("2025-01-31")),
            Condition::Before(date, json!("2025-01-16")),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 0);
        assert_eq!(
            sql,
            "\"week_start\" IS NOT NULL AND \"week_start\" BETWEEN $1::date AND $2::date AND \"week_start\" < $3::date"
        );
        assert_eq!(params, vec![json!("2025-01-01"), json!("2025-01-31"), json!("2025-01-16")]);
    }

    #[test]
    fn renders_composite_cursor_with_each_value_bound_once() {
        let conditions = vec![Condition::BeforeComposite {
            primary: col(TableId::Weather, "date"),
            primary_value: json!("2025-02-01"),
            secondary: col(TableId::Weather, "weather_id"),
            secondary_value: json!("W0007"),
        }];
        let (sql, params) = FilterWhere::generate(&conditions, 2);
        assert_eq!(
            sql,
            "(\"date\" < $3::date OR (\"date\" = $3::date AND \"weather_id\" COLLATE \"C\" < $4::text))"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_conditions_render_tautology() {
        let (sql, params) = FilterWhere::generate(&[], 0);
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_renders_is_null() {
        let token = col(TableId::Users, "token");
        let (sql, params) = FilterWhere::generate(&[Condition::Eq(token, Value::Null)], 0);
        assert_eq!(sql, "\"token\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn matches_with_null_semantics() {
        let date = col(TableId::Weather, "date");
        let id = col(TableId::Weather, "weather_id");
        let record: Record = json!({ "weather_id": "W0002", "date": "2025-02-01" })
            .as_object()
            .cloned()
            .unwrap();
        let undated: Record = json!({ "weather_id": "W0003", "date": null })
            .as_object()
            .cloned()
            .unwrap();

        let composite = Condition::BeforeComposite {
            primary: date,
            primary_value: json!("2025-02-01"),
            secondary: id,
            secondary_value: json!("W0005"),
        };
        assert!(FilterWhere::matches(&[composite.clone()], &record));
        assert!(!FilterWhere::matches(&[composite], &undated));
        assert!(!FilterWhere::matches(&[Condition::NotNull(date)], &undated));
        assert!(FilterWhere::matches(
            &[Condition::Between(date, json!("2025-02-01"), json!("2025-02-01"))],
            &record
        ));
        assert!(!FilterWhere::matches(&[Condition::Before(date, json!("2025-02-01"))], &record));
    }
}

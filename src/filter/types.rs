use serde_json::Value;

use crate::database::schema::ColumnDef;

/// A single predicate over catalog columns.
///
/// Columns are resolved against the table catalog before a condition is
/// built, so rendering never sees a free-form identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column IS NOT NULL`
    NotNull(&'static ColumnDef),
    /// `column = value`, or `column IS NULL` when the value is null
    Eq(&'static ColumnDef, Value),
    /// Inclusive on both ends
    Between(&'static ColumnDef, Value, Value),
    /// `column < value`, the exclusive lower bound of a descending cursor
    Before(&'static ColumnDef, Value),
    /// `(primary < p) OR (primary = p AND secondary < s)`
    BeforeComposite {
        primary: &'static ColumnDef,
        primary_value: Value,
        secondary: &'static ColumnDef,
        secondary_value: Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: &'static ColumnDef,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

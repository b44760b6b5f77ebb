use std::fmt;
use thiserror::Error;

/// What a failed statement was trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Select,
    Count,
    Insert,
    Update,
    Delete,
    GenerateId,
    Ping,
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryIntent::Select => "select",
            QueryIntent::Count => "count",
            QueryIntent::Insert => "insert",
            QueryIntent::Update => "update",
            QueryIntent::Delete => "delete",
            QueryIntent::GenerateId => "generate_id",
            QueryIntent::Ping => "ping",
        };
        f.write_str(s)
    }
}

/// Errors raised by the record store, the pagination engine and the
/// record helpers. Not-found is never an error here; lookups return `None`
/// and writes report `success = false`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{intent} on {table} failed: {source}")]
    Query {
        table: &'static str,
        intent: QueryIntent,
        #[source]
        source: sqlx::Error,
    },

    #[error("{intent} on {table} exceeded {timeout_ms}ms")]
    Timeout {
        table: &'static str,
        intent: QueryIntent,
        timeout_ms: u64,
    },

    #[error("Composite cursor requires both cursor_date and cursor_id")]
    InvalidCursor,

    #[error("Duplicate id {id} in {table}")]
    DuplicateId { table: &'static str, id: String },

    #[error("Limit must be a positive integer, got {0}")]
    InvalidLimit(i64),

    #[error("Date range requires both start and end")]
    InvalidRange,

    #[error("Unknown column {column} on {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Invalid value for {column}: {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Update on {0} has no columns to set")]
    EmptyUpdate(&'static str),

    #[error("Invalid id format: {0}")]
    InvalidIdFormat(String),

    #[error("{0} has no secondary ordering column")]
    MissingSecondaryOrder(&'static str),
}

impl StoreError {
    pub fn query(table: &'static str, intent: QueryIntent, source: sqlx::Error) -> Self {
        StoreError::Query { table, intent, source }
    }

    /// Errors caused by the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            StoreError::Query { .. } | StoreError::Timeout { .. } | StoreError::MissingSecondaryOrder(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_table_and_intent() {
        let err = StoreError::Timeout { table: "weather_data", intent: QueryIntent::Count, timeout_ms: 50 };
        assert_eq!(err.to_string(), "count on weather_data exceeded 50ms");

        let err = StoreError::query("mine_master", QueryIntent::Select, sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("select on mine_master failed"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn validation_errors_are_client_errors() {
        assert!(StoreError::InvalidCursor.is_client_error());
        assert!(StoreError::InvalidLimit(0).is_client_error());
        assert!(StoreError::EmptyUpdate("users").is_client_error());
    }
}

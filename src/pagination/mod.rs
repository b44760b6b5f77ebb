//! Keyset pagination over a single ordering column or a `(date, id)` pair.

pub mod engine;
pub mod query;

use serde_json::Value;
use tracing::warn;

use crate::config::PaginationConfig;
use crate::database::{Record, StoreError};

pub use engine::{fetch_paginated_composite, fetch_paginated_data};
pub use query::PaginationQuery;

/// Caller-controlled page parameters, cursor excluded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub start: Option<Value>,
    pub end: Option<Value>,
    /// Return every matching row in one response
    pub all: bool,
}

/// Position after the last row of a page. Exclusive in descending order.
#[derive(Debug, Clone, PartialEq)]
pub enum Cursor {
    Scalar(Value),
    Composite { date: Value, id: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Record>,
    /// `None` on the last page, on an empty page, and in `all` mode
    pub next_cursor: Option<Cursor>,
    /// Rows matching the date range, independent of the cursor
    pub total: i64,
    /// Effective page size after defaulting and clamping
    pub limit: i64,
}

/// Default a missing limit, reject non-positive ones and clamp to the
/// configured maximum.
pub fn resolve_limit(requested: Option<i64>, config: &PaginationConfig) -> Result<i64, StoreError> {
    match requested {
        None => Ok(config.default_limit),
        Some(limit) if limit <= 0 => Err(StoreError::InvalidLimit(limit)),
        Some(limit) if limit > config.max_limit => {
            warn!(requested = limit, max = config.max_limit, "Limit exceeds maximum, clamping");
            Ok(config.max_limit)
        }
        Some(limit) => Ok(limit),
    }
}

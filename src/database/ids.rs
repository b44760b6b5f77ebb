//! Sequential, prefixed record identifiers such as `EQ006` or `PLAN0012`.

use serde_json::Value;
use tracing::debug;

use super::error::StoreError;
use super::schema::TableId;
use super::statement::InsertStatement;
use super::store::RecordStore;
use super::value::RecordData;
use crate::filter::SqlResult;

/// Widest suffix that still fits in a BIGINT
const MAX_SUFFIX_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFormat {
    prefix: String,
    width: usize,
}

impl IdFormat {
    /// The prefix is restricted to ASCII letters and digits so it can be used
    /// in a LIKE pattern without escaping.
    pub fn new(prefix: &str, width: usize) -> Result<Self, StoreError> {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StoreError::InvalidIdFormat(format!("prefix {:?} must be ASCII alphanumeric", prefix)));
        }
        if width == 0 || width > MAX_SUFFIX_DIGITS {
            return Err(StoreError::InvalidIdFormat(format!(
                "digit width {} must be between 1 and {}",
                width, MAX_SUFFIX_DIGITS
            )));
        }
        Ok(Self { prefix: prefix.to_string(), width })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Zero-padded to the width; wider numbers are kept whole
    pub fn format(&self, n: i64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }

    /// Id following the largest existing suffix. An empty table starts at 0.
    pub fn next_after(&self, max_suffix: Option<i64>) -> String {
        match max_suffix {
            Some(n) => self.format(n + 1),
            None => self.format(0),
        }
    }

    /// Numeric suffix of `id` if it is this prefix followed only by digits
    pub fn suffix_of(&self, id: &str) -> Option<i64> {
        let digits = id.strip_prefix(self.prefix.as_str())?;
        if digits.is_empty() || digits.len() > MAX_SUFFIX_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Query for the largest qualifying suffix of `column` in `table`
    pub fn max_suffix_sql(&self, table: &str, column: &str) -> SqlResult {
        let suffix = format!("SUBSTRING(\"{}\" FROM {})", column, self.prefix.len() + 1);
        SqlResult {
            query: format!(
                "SELECT MAX(CAST({suffix} AS BIGINT)) AS max_suffix FROM \"{table}\" \
                 WHERE \"{column}\" LIKE $1::text AND {suffix} ~ '^[0-9]{{1,{digits}}}$'",
                digits = MAX_SUFFIX_DIGITS,
            ),
            params: vec![Value::String(format!("{}%", self.prefix))],
        }
    }
}

/// Next identifier for `table`: the largest existing `prefix`+digits value
/// plus one, zero-padded to `digit_width`.
///
/// This reads and then decides, so two concurrent callers can receive the
/// same id; the later insert then fails with `DuplicateId`. Use
/// [`insert_with_generated_id`] when the id is about to be inserted.
pub async fn generate_next_id(
    store: &dyn RecordStore,
    table: TableId,
    id_column: &str,
    prefix: &str,
    digit_width: usize,
) -> Result<String, StoreError> {
    let descriptor = table.descriptor();
    let column = descriptor.column(id_column)?;
    let format = IdFormat::new(prefix, digit_width)?;

    let max = store.max_id_suffix(descriptor, column, format.prefix()).await?;
    Ok(format.next_after(max))
}

/// Allocate the next identifier and insert `data` under it as one
/// serialized step. Returns the new id.
pub async fn insert_with_generated_id(
    store: &dyn RecordStore,
    table: TableId,
    id_column: &str,
    prefix: &str,
    digit_width: usize,
    data: RecordData,
) -> Result<String, StoreError> {
    let descriptor = table.descriptor();
    let column = descriptor.column(id_column)?;
    let format = IdFormat::new(prefix, digit_width)?;

    let mut data = data;
    data.remove(id_column);
    let stmt = InsertStatement::new(descriptor, data)?;

    let id = store.insert_with_generated_id(stmt, column, &format).await?;
    debug!(table = descriptor.name, %id, "Inserted record with generated id");
    Ok(id)
}

use serde::Deserialize;
use serde_json::Value;

use super::PageRequest;
use crate::database::StoreError;

/// Query-string parameters accepted by every listing endpoint.
///
/// Everything arrives as text so malformed values surface as validation
/// errors instead of extractor rejections. Empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub cursor_date: Option<String>,
    pub cursor_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all: Option<String>,
}

fn present(value: &Option<String>) -> Option<Value> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Value::String(s.to_string()))
}

impl PaginationQuery {
    /// `limit` is only validated when paging; `all=true` ignores it.
    pub fn page_request(&self) -> Result<PageRequest, StoreError> {
        let all = self.all.as_deref() == Some("true");
        let limit = match present(&self.limit) {
            Some(Value::String(s)) => match s.parse::<i64>() {
                Ok(limit) => Some(limit),
                Err(_) if all => None,
                Err(_) => {
                    return Err(StoreError::InvalidValue {
                        column: "limit".to_string(),
                        reason: "expected an integer".to_string(),
                    })
                }
            },
            _ => None,
        };

        Ok(PageRequest {
            limit,
            start: present(&self.start),
            end: present(&self.end),
            all,
        })
    }

    pub fn cursor(&self) -> Option<Value> {
        present(&self.cursor)
    }

    pub fn cursor_date(&self) -> Option<Value> {
        present(&self.cursor_date)
    }

    pub fn cursor_id(&self) -> Option<Value> {
        present(&self.cursor_id)
    }
}

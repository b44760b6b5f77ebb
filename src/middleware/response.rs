use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::pagination::{Cursor, Page};

/// Wrapper for API responses that adds the `{ message, error: false, data }`
/// envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with a payload
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status_code: None,
        }
    }

    /// 201 Created with a payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status_code: Some(StatusCode::CREATED),
        }
    }
}

impl ApiResponse<Value> {
    /// 200 OK without a `data` field
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = json!({
            "message": self.message,
            "error": false,
        });

        if let Some(data) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": true,
                            "message": "Failed to serialize response data",
                            "code": "INTERNAL_SERVER_ERROR"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(envelope)).into_response()
    }
}

/// Listing envelope:
/// `{ message, error: false, limit, nextCursor | nextCursorDate + nextCursorId, total, data }`
#[derive(Debug)]
pub struct PageResponse {
    pub message: String,
    pub page: Page,
    /// Emit `nextCursorDate`/`nextCursorId` instead of `nextCursor`
    pub composite: bool,
}

impl PageResponse {
    pub fn scalar(message: impl Into<String>, page: Page) -> Self {
        Self { message: message.into(), page, composite: false }
    }

    pub fn composite(message: impl Into<String>, page: Page) -> Self {
        Self { message: message.into(), page, composite: true }
    }

    pub fn to_json(self) -> Value {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(self.message));
        body.insert("error".into(), Value::Bool(false));
        body.insert("limit".into(), json!(self.page.limit));

        match (self.page.next_cursor, self.composite) {
            (Some(Cursor::Composite { date, id }), _) => {
                body.insert("nextCursorDate".into(), date);
                body.insert("nextCursorId".into(), id);
            }
            (Some(Cursor::Scalar(value)), _) => {
                body.insert("nextCursor".into(), value);
            }
            (None, true) => {
                body.insert("nextCursorDate".into(), Value::Null);
                body.insert("nextCursorId".into(), Value::Null);
            }
            (None, false) => {
                body.insert("nextCursor".into(), Value::Null);
            }
        }

        body.insert("total".into(), json!(self.page.total));
        body.insert(
            "data".into(),
            Value::Array(self.page.rows.into_iter().map(Value::Object).collect()),
        );
        Value::Object(body)
    }
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.to_json())).into_response()
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
pub type PageResult = Result<PageResponse, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn page(next_cursor: Option<Cursor>) -> Page {
        let row = json!({"weather_id": "W002", "date": "2025-01-02"});
        Page {
            rows: vec![row.as_object().unwrap().clone()],
            next_cursor,
            total: 3,
            limit: 1,
        }
    }

    #[test]
    fn scalar_listing_envelope() {
        let body = PageResponse::scalar("Weather loaded", page(Some(Cursor::Scalar(json!("2025-01-02"))))).to_json();
        assert_eq!(body["error"], false);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["nextCursor"], "2025-01-02");
        assert_eq!(body["total"], 3);
        assert_eq!(body["data"][0]["weather_id"], "W002");
    }

    #[test]
    fn composite_listing_envelope() {
        let cursor = Cursor::Composite { date: json!("2025-01-02"), id: json!("W002") };
        let body = PageResponse::composite("Weather loaded", page(Some(cursor))).to_json();
        assert_eq!(body["nextCursorDate"], "2025-01-02");
        assert_eq!(body["nextCursorId"], "W002");
        assert!(body.get("nextCursor").is_none());

        let last = PageResponse::composite("Weather loaded", page(None)).to_json();
        assert!(last["nextCursorDate"].is_null());
        assert!(last["nextCursorId"].is_null());
    }
}

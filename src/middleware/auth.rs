use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::{decode_jwt, Role};
use crate::database::{find_by_id, TableId};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context, loaded from the `users` row named by the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    /// Role stored on the user's row
    pub role: String,
}

impl AuthUser {
    /// 403 unless the stored role is exactly `role`
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role.as_str() {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Access denied: only {} may access this resource", role)))
        }
    }

    /// 403 unless the path id names the authenticated user
    pub fn require_self(&self, path_id: &str) -> Result<(), ApiError> {
        if path_id.trim() == self.id.to_string() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access denied: you may only manage your own account"))
        }
    }
}

/// JWT authentication middleware.
///
/// A token that fails signature or expiry checks is a 401. A well-formed
/// token that no longer matches the `token` column of its user (logged out
/// or reissued) is a 403.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = decode_jwt(&token)?;

    let row = find_by_id(state.store(), TableId::Users, "id", &json!(claims.id), &["id", "role", "token"]).await?;
    let Some(row) = row else {
        warn!(user_id = claims.id, "Token presented for unknown user");
        return Err(ApiError::forbidden("Invalid token"));
    };

    if row.get("token").and_then(Value::as_str) != Some(token.as_str()) {
        debug!(user_id = claims.id, "Token does not match stored session");
        return Err(ApiError::forbidden("Invalid token"));
    }

    let auth_user = AuthUser {
        id: claims.id,
        role: row.get("role").and_then(Value::as_str).unwrap_or_default().to_string(),
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

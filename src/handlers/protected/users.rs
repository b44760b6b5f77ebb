// handlers/protected/users.rs - profile, role and session endpoints for `users`
//
// Registration, login and password handling live outside this service; these
// routes only read and maintain rows that already exist.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::info;

use super::payload::PayloadRules;
use super::records::{self, Resource};
use crate::auth::Role;
use crate::database::{delete_by_id, update_record, RecordData, TableId};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Profile edits may touch `nama` and `email` only
pub const USERS: Resource = Resource::new(TableId::Users, "User")
    .create(PayloadRules::new(TableId::Users).managed(&["role", "token", "updated_at"]));

#[derive(Debug, serde::Deserialize)]
pub struct RoleUpdate {
    pub role: Option<String>,
}

pub async fn user_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    records::show(&state, &USERS, &id).await
}

pub async fn user_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_self(&id)?;
    let Json(body) = body?;
    records::update(&state, &USERS, &id, &body).await
}

/// PUT /users/:id/role - admins assign one of the known roles
pub async fn user_role_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<RoleUpdate>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::Admin)?;
    let Json(body) = body?;

    let role = body
        .role
        .as_deref()
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .ok_or_else(|| ApiError::field_error("Missing required field", "role", "field is required"))?;
    let role: Role = role
        .parse()
        .map_err(|reason: String| ApiError::field_error("Invalid field format", "role", reason))?;

    let data = RecordData::new().set("role", Value::from(role.as_str()));
    let outcome = update_record(state.store(), TableId::Users, data, "id", &json!(id)).await?;
    if !outcome.success {
        return Err(records::not_found(&USERS));
    }

    info!(user_id = %id, %role, changed_by = user.id, "User role updated");
    Ok(ApiResponse::message("User role updated"))
}

pub async fn user_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_self(&id)?;

    let outcome = delete_by_id(state.store(), TableId::Users, "id", &json!(user.id)).await?;
    if !outcome.success {
        return Err(records::not_found(&USERS));
    }

    info!(user_id = user.id, "User deleted");
    Ok(ApiResponse::message("User deleted"))
}

/// DELETE /logout/:id - clear the stored token so it stops authenticating
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_self(&id)?;

    let data = RecordData::new().set("token", Value::Null);
    let outcome = update_record(state.store(), TableId::Users, data, "id", &json!(user.id)).await?;
    if !outcome.success {
        return Err(records::not_found(&USERS));
    }

    info!(user_id = user.id, "User logged out");
    Ok(ApiResponse::message("Logged out"))
}

// handlers/protected/equipment.rs - /equipments (mine planners only)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use super::payload::PayloadRules;
use super::records::{self, Resource};
use crate::auth::Role;
use crate::database::TableId;
use crate::middleware::{ApiResult, AuthUser, PageResult};
use crate::pagination::PaginationQuery;
use crate::state::AppState;

pub const EQUIPMENT: Resource = Resource::new(TableId::Equipment, "Equipment")
    .ids("EQ", 3)
    .create(PayloadRules::new(TableId::Equipment).required(&["mine_id"]));

pub async fn equipment_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PaginationQuery>,
) -> PageResult {
    user.require_role(Role::MinePlanner)?;
    records::list_composite(&state, &EQUIPMENT, &query).await
}

pub async fn equipment_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    records::show(&state, &EQUIPMENT, &id).await
}

pub async fn equipment_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::create(&state, &EQUIPMENT, &body).await
}

pub async fn equipment_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::update(&state, &EQUIPMENT, &id, &body).await
}

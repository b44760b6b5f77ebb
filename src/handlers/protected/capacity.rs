// handlers/protected/capacity.rs - /effective-capacity (mine planners only)

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

pub const EFFECTIVE_CAPACITY: Resource = Resource::new(TableId::EffectiveCapacity, "Effective capacity")
    .ids("EFC", 4)
    .create(PayloadRules::new(TableId::EffectiveCapacity).required(&["mine_id", "equipment_id"]));

pub async fn capacity_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PaginationQuery>,
) -> PageResult {
    user.require_role(Role::MinePlanner)?;
    records::list_composite(&state, &EFFECTIVE_CAPACITY, &query).await
}

pub async fn capacity_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::create(&state, &EFFECTIVE_CAPACITY, &body).await
}

pub async fn capacity_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::update(&state, &EFFECTIVE_CAPACITY, &id, &body).await
}

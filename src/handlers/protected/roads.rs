// handlers/protected/roads.rs - GET /roads, PUT /roads/:id

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use super::records::{self, Resource};
use crate::auth::Role;
use crate::database::TableId;
use crate::middleware::{ApiResult, AuthUser, PageResult};
use crate::pagination::PaginationQuery;
use crate::state::AppState;

pub const ROADS: Resource = Resource::new(TableId::Roads, "Road condition");

pub async fn roads_list(State(state): State<AppState>, Query(query): Query<PaginationQuery>) -> PageResult {
    records::list_composite(&state, &ROADS, &query).await
}

pub async fn road_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::update(&state, &ROADS, &id, &body).await
}

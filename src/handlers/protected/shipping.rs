// handlers/protected/shipping.rs - /shipping-schedules (shipping planners only)

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

pub const SHIPPING: Resource = Resource::new(TableId::Shipping, "Shipping schedule")
    .ids("SHP", 4)
    .create(PayloadRules::new(TableId::Shipping).required(&["mine_id"]));

pub async fn shipping_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PaginationQuery>,
) -> PageResult {
    user.require_role(Role::ShippingPlanner)?;
    records::list_composite(&state, &SHIPPING, &query).await
}

pub async fn shipping_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(Role::ShippingPlanner)?;
    records::show(&state, &SHIPPING, &id).await
}

pub async fn shipping_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::ShippingPlanner)?;
    let Json(body) = body?;
    records::create(&state, &SHIPPING, &body).await
}

pub async fn shipping_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::ShippingPlanner)?;
    let Json(body) = body?;
    records::update(&state, &SHIPPING, &id, &body).await
}

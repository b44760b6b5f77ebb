// handlers/protected/production.rs - /production-plans

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

pub const PRODUCTION_PLANS: Resource = Resource::new(TableId::ProductionPlans, "Production plan")
    .ids("PLAN", 4)
    .create(PayloadRules::new(TableId::ProductionPlans).required(&["mine_id"]));

/// Readable by every authenticated user; writes are for mine planners
pub async fn plans_list(State(state): State<AppState>, Query(query): Query<PaginationQuery>) -> PageResult {
    records::list_composite(&state, &PRODUCTION_PLANS, &query).await
}

pub async fn plans_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::create(&state, &PRODUCTION_PLANS, &body).await
}

pub async fn plans_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::update(&state, &PRODUCTION_PLANS, &id, &body).await
}

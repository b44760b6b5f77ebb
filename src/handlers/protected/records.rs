// handlers/protected/records.rs - list/show/create/update shared by the table resources
//
// Each resource module declares a `Resource` and wires thin axum handlers to
// these functions after checking its role gate.

use serde_json::{json, Map, Value};
use tracing::info;

use super::payload::PayloadRules;
use crate::database::{
    build_dynamic_update, find_by_id, insert_with_generated_id, RawExpr, RecordData, TableId, UpdateOptions,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, PageResponse, PageResult};
use crate::pagination::{fetch_paginated_composite, fetch_paginated_data, PaginationQuery};
use crate::state::AppState;

/// Generated identifier shape for a table, e.g. `EQ` + 3 digits
#[derive(Debug, Clone, Copy)]
pub struct IdScheme {
    pub prefix: &'static str,
    pub width: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub table: TableId,
    /// Human name used in response messages
    pub noun: &'static str,
    pub ids: Option<IdScheme>,
    pub create: PayloadRules,
    /// Columns set with a SQL expression on create
    pub create_defaults: &'static [(&'static str, RawExpr)],
}

impl Resource {
    pub const fn new(table: TableId, noun: &'static str) -> Self {
        Self {
            table,
            noun,
            ids: None,
            create: PayloadRules::new(table),
            create_defaults: &[],
        }
    }

    pub const fn ids(mut self, prefix: &'static str, width: usize) -> Self {
        self.ids = Some(IdScheme { prefix, width });
        self
    }

    pub const fn create(mut self, rules: PayloadRules) -> Self {
        self.create = rules;
        self
    }

    pub const fn create_defaults(mut self, defaults: &'static [(&'static str, RawExpr)]) -> Self {
        self.create_defaults = defaults;
        self
    }

    fn id_column(&self) -> &'static str {
        self.table.descriptor().id_column
    }

    /// Updates accept every non-id column the create rules accept, none required
    fn update_rules(&self) -> PayloadRules {
        PayloadRules::new(self.table).managed(self.create.managed)
    }

    /// Only tables that carry `updated_at` get it refreshed
    fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            auto_timestamp: self.table.descriptor().has_column("updated_at"),
        }
    }
}

pub async fn list(state: &AppState, resource: &Resource, query: &PaginationQuery) -> PageResult {
    let request = query.page_request()?;
    let page = fetch_paginated_data(state.store(), resource.table, &request, query.cursor().as_ref()).await?;
    Ok(PageResponse::scalar(format!("{} data loaded", resource.noun), page))
}

pub async fn list_composite(state: &AppState, resource: &Resource, query: &PaginationQuery) -> PageResult {
    let request = query.page_request()?;
    let page = fetch_paginated_composite(
        state.store(),
        resource.table,
        &request,
        query.cursor_date().as_ref(),
        query.cursor_id().as_ref(),
    )
    .await?;
    Ok(PageResponse::composite(format!("{} data loaded", resource.noun), page))
}

pub async fn show(state: &AppState, resource: &Resource, id: &str) -> ApiResult<Value> {
    let row = find_by_id(state.store(), resource.table, resource.id_column(), &json!(id), &[])
        .await?
        .ok_or_else(|| not_found(resource))?;
    Ok(ApiResponse::success(format!("{} loaded", resource.noun), Value::Object(row)))
}

pub async fn create(state: &AppState, resource: &Resource, body: &Value) -> ApiResult<Value> {
    let ids = resource
        .ids
        .ok_or_else(|| ApiError::internal_server_error("Resource does not support creation"))?;

    let mut data = resource.create.parse(body)?;
    for (column, expr) in resource.create_defaults {
        data = data.raw(*column, *expr);
    }

    let id_column = resource.id_column();
    let id = insert_with_generated_id(state.store(), resource.table, id_column, ids.prefix, ids.width, data).await?;
    info!(table = resource.table.table_name(), %id, "Record created");

    let mut created = Map::new();
    created.insert(id_column.to_string(), Value::String(id));
    Ok(ApiResponse::created(format!("{} created", resource.noun), Value::Object(created)))
}

pub async fn update(state: &AppState, resource: &Resource, id: &str, body: &Value) -> ApiResult<Value> {
    let data = resource.update_rules().parse(body)?;
    update_data(state, resource, id, data).await
}

/// Apply already-validated data, answering 404 when no row matched
pub async fn update_data(state: &AppState, resource: &Resource, id: &str, data: RecordData) -> ApiResult<Value> {
    let outcome = build_dynamic_update(
        state.store(),
        resource.table,
        data,
        resource.id_column(),
        &json!(id),
        resource.update_options(),
    )
    .await?;

    if !outcome.success {
        return Err(not_found(resource));
    }
    Ok(ApiResponse::message(format!("{} updated", resource.noun)))
}

pub fn not_found(resource: &Resource) -> ApiError {
    ApiError::not_found(format!("{} not found", resource.noun))
}

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::json_rows;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonObject};
use crate::state::AppState;
use crate::store::Table;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional equality filter on the category column
    pub category: Option<String>,
}

/// GET /products - all products, optionally restricted to one category
pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Value> {
    let mut filter = Filter::new();
    if let Some(category) = query.category.filter(|c| !c.is_empty()) {
        filter = filter.eq("category", category);
    }

    let rows = state.store.select(Table::Products, &filter).await?;
    Ok(ApiResponse::success(json_rows(rows)))
}

/// GET /products/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let row = state
        .store
        .select_single(Table::Products, &Filter::new().eq("id", id))
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(ApiResponse::success(Value::Object(row)))
}

/// POST /products [admin]
pub async fn create(State(state): State<AppState>, JsonObject(product): JsonObject) -> ApiResult<Value> {
    let rows = state.store.insert(Table::Products, product).await?;
    tracing::info!("created {} product row(s)", rows.len());
    Ok(ApiResponse::created(json_rows(rows)))
}

/// PUT /products/:id [admin] - partial update of the given fields
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonObject(changes): JsonObject,
) -> ApiResult<Value> {
    let rows = state
        .store
        .update(Table::Products, changes, &Filter::new().eq("id", id))
        .await?;
    Ok(ApiResponse::success(json_rows(rows)))
}

/// DELETE /products/:id [admin] - succeeds whether or not the product existed
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let removed = state.store.delete(Table::Products, &Filter::new().eq("id", id)).await?;
    tracing::info!("deleted product {} ({} row(s))", id, removed.len());
    Ok(ApiResponse::success(json!({ "message": format!("Product {} deleted", id) })))
}

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::{ContentSummary, ItemType};
use crate::services::bulk::BulkAction;
use crate::state::AppState;

fn parse_item_type(item_type: &str) -> AppResult<ItemType> {
    item_type
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown content type: {}", item_type)))
}

#[derive(Debug, Deserialize)]
pub struct SelectionForm {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub selection: Vec<i64>,
}

/// Bodies for the bulk endpoints. Omitting `ids` applies the change to the
/// current selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCategoryForm {
    pub ids: Option<Vec<i64>>,
    pub category_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusForm {
    pub ids: Option<Vec<i64>>,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkDeleteForm {
    pub ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkResponse {
    pub updated: usize,
    pub selection: Vec<i64>,
}

/// GET /admin/content/:item_type
pub async fn list(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
) -> AppResult<Json<Vec<ContentSummary>>> {
    let item_type = parse_item_type(&item_type)?;
    Ok(Json(state.cached_listing(item_type).await?))
}

/// GET /admin/content/:item_type/selection
pub async fn selection(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
) -> AppResult<Json<SelectionResponse>> {
    let item_type = parse_item_type(&item_type)?;
    Ok(Json(SelectionResponse {
        selection: state.selections.get(item_type),
    }))
}

/// PUT /admin/content/:item_type/selection
pub async fn replace_selection(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
    JsonBody(form): JsonBody<SelectionForm>,
) -> AppResult<Json<SelectionResponse>> {
    let item_type = parse_item_type(&item_type)?;
    Ok(Json(SelectionResponse {
        selection: state.selections.replace(item_type, &form.ids),
    }))
}

/// POST /admin/content/:item_type/selection/toggle
pub async fn toggle_selection(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
    JsonBody(form): JsonBody<ToggleForm>,
) -> AppResult<Json<SelectionResponse>> {
    let item_type = parse_item_type(&item_type)?;
    Ok(Json(SelectionResponse {
        selection: state.selections.toggle(item_type, form.id),
    }))
}

/// DELETE /admin/content/:item_type/selection
pub async fn clear_selection(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
) -> AppResult<Json<SelectionResponse>> {
    let item_type = parse_item_type(&item_type)?;
    state.selections.clear(item_type);
    Ok(Json(SelectionResponse { selection: vec![] }))
}

async fn apply_bulk(
    state: &AppState,
    item_type: ItemType,
    ids: Option<Vec<i64>>,
    action: BulkAction,
) -> AppResult<Json<BulkResponse>> {
    let ids = ids.unwrap_or_else(|| state.selections.get(item_type));
    let updated = state.bulk().apply(item_type, &ids, action).await?;
    Ok(Json(BulkResponse {
        updated,
        selection: state.selections.get(item_type),
    }))
}

/// POST /admin/content/:item_type/bulk-category
pub async fn bulk_category(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
    JsonBody(form): JsonBody<BulkCategoryForm>,
) -> AppResult<Json<BulkResponse>> {
    let item_type = parse_item_type(&item_type)?;
    apply_bulk(
        &state,
        item_type,
        form.ids,
        BulkAction::SetCategory(form.category_id),
    )
    .await
}

/// POST /admin/content/:item_type/bulk-status
pub async fn bulk_status(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
    JsonBody(form): JsonBody<BulkStatusForm>,
) -> AppResult<Json<BulkResponse>> {
    let item_type = parse_item_type(&item_type)?;
    apply_bulk(&state, item_type, form.ids, BulkAction::SetStatus(form.status)).await
}

/// POST /admin/content/:item_type/bulk-delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    Path(item_type): Path<String>,
    JsonBody(form): JsonBody<BulkDeleteForm>,
) -> AppResult<Json<BulkResponse>> {
    let item_type = parse_item_type(&item_type)?;
    apply_bulk(&state, item_type, form.ids, BulkAction::Delete).await
}

//! HTTP handlers for the trash (soft-deleted items)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::ActiveInventory;
use crate::models::{InventoryItem, TrashedItem};
use crate::services::ItemService;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Debug, Serialize)]
pub struct PurgeSweepResponse {
    pub purged: u64,
}

/// List trashed items, most recently deleted first
pub async fn list_trash(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<TrashedItem>>> {
    let service = ItemService::new(state.db);
    let (items, meta) = service.list_deleted_items(inventory_id, pagination).await?;
    Ok(Json(PaginatedResponse {
        data: items,
        pagination: meta,
    }))
}

/// Bring a trashed item back to the active inventory
pub async fn restore_item(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let service = ItemService::new(state.db);
    let item = service.restore_item(inventory_id, item_id).await?;
    Ok(Json(item))
}

/// Permanently delete a trashed item
pub async fn purge_item(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ItemService::new(state.db);
    service.purge_item(inventory_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Purge everything trashed longer than the retention window
pub async fn purge_old(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
) -> AppResult<Json<PurgeSweepResponse>> {
    let service = ItemService::new(state.db.clone());
    let purged = service
        .purge_old_deleted_items(inventory_id, state.config.retention.trash_days)
        .await?;
    Ok(Json(PurgeSweepResponse { purged }))
}

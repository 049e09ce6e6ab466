//! HTTP handlers for inventory item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{ActiveInventory, CurrentUser};
use crate::models::{
    ExpiringItemEntry, InventoryItem, ItemLot, ItemSummary, OldestItemEntry, Operation,
    TransactionStatus,
};
use crate::services::item::{CreateItemInput, UpdateItemInput};
use crate::services::lot::CreateLotInput;
use crate::services::{AuditService, ItemService, LocationService, LotService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_expiring_days")]
    pub days: i64,
}

#[derive(Debug, Deserialize)]
pub struct OldestQuery {
    pub location: Option<String>,
    #[serde(default = "default_oldest_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

fn default_limit() -> i64 {
    50
}

fn default_expiring_days() -> i64 {
    7
}

fn default_oldest_limit() -> i64 {
    10
}

/// List active items, optionally filtered by category or location name
pub async fn list_items(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<ItemSummary>>> {
    let service = ItemService::new(state.db);
    let items = service
        .list_items(
            inventory_id,
            query.category.as_deref(),
            query.location.as_deref(),
            query.limit,
        )
        .await?;
    Ok(Json(items))
}

/// Create an item with its initial lot.
///
/// The item row starts at quantity zero and the initial lot brings it up,
/// so the lot-sum invariant holds from the first write.
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ActiveInventory(inventory_id): ActiveInventory,
    Json(input): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let items = ItemService::new(state.db.clone());
    let lots = LotService::new(state.db.clone());
    let locations = LocationService::new(state.db.clone());
    let audit = AuditService::new(state.db.clone());

    let location_id = match input.location.as_deref() {
        Some(name) => Some(
            locations
                .get_or_create_location(inventory_id, name, None)
                .await?
                .id,
        ),
        None => None,
    };

    let embedding = match state.embedding_client() {
        Some(client) => {
            let text = embedding_text(&input.name, input.description.as_deref());
            client.embed_or_none(&text).await
        }
        None => None,
    };

    let item = items
        .create_item(
            inventory_id,
            CreateItemInput {
                name: input.name,
                quantity: 0,
                category: input.category,
                description: input.description,
                location_id,
            },
            embedding,
        )
        .await?;

    let item = if input.quantity > 0 {
        lots.create_lot(
            item.id,
            current_user.0.user_id,
            Some(inventory_id),
            CreateLotInput {
                quantity: input.quantity,
                notes: None,
                expiration_date: input.expiration_date,
            },
        )
        .await?;
        items.get_item(inventory_id, item.id).await?
    } else {
        item
    };

    audit
        .log_transaction(
            inventory_id,
            Operation::Create,
            Some(item.id),
            Some(json!({ "name": item.name, "quantity": item.quantity })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Get a single active item
pub async fn get_item(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let service = ItemService::new(state.db);
    let item = service.get_item(inventory_id, item_id).await?;
    Ok(Json(item))
}

/// Update an active item's metadata
pub async fn update_item(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemRequest>,
) -> AppResult<Json<InventoryItem>> {
    let items = ItemService::new(state.db.clone());
    let locations = LocationService::new(state.db.clone());
    let audit = AuditService::new(state.db.clone());

    let location_id = match input.location.as_deref() {
        Some(name) => Some(
            locations
                .get_or_create_location(inventory_id, name, None)
                .await?
                .id,
        ),
        None => None,
    };

    // Re-embed only when the searchable text changed
    let embedding = if input.name.is_some() || input.description.is_some() {
        match state.embedding_client() {
            Some(client) => {
                let existing = items.get_item(inventory_id, item_id).await?;
                let name = input.name.as_deref().unwrap_or(&existing.name);
                let description = input
                    .description
                    .as_deref()
                    .or(existing.description.as_deref());
                client.embed_or_none(&embedding_text(name, description)).await
            }
            None => None,
        }
    } else {
        None
    };

    let item = items
        .update_item(
            inventory_id,
            item_id,
            UpdateItemInput {
                name: input.name,
                category: input.category,
                description: input.description,
                location_id,
            },
            embedding,
        )
        .await?;

    audit
        .log_transaction(
            inventory_id,
            Operation::Update,
            Some(item.id),
            Some(json!({ "name": item.name })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok(Json(item))
}

/// Move an item to the trash
pub async fn delete_item(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let service = ItemService::new(state.db.clone());
    let audit = AuditService::new(state.db);

    let deleted = service.delete_item(inventory_id, item_id).await?;
    if deleted {
        audit
            .log_transaction(
                inventory_id,
                Operation::Delete,
                Some(item_id),
                None,
                TransactionStatus::Confirmed,
            )
            .await?;
    }

    Ok(Json(DeleteResponse { deleted }))
}

/// List the lots of an item, oldest first
pub async fn get_item_lots(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<ItemLot>>> {
    let items = ItemService::new(state.db.clone());
    let lots = LotService::new(state.db);

    // Scope check before touching the ledger
    items.get_item(inventory_id, item_id).await?;
    let result = lots.get_lots_for_item(item_id).await?;
    Ok(Json(result))
}

/// List lots expiring within the given window
pub async fn expiring_items(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<ExpiringItemEntry>>> {
    let service = LotService::new(state.db);
    let entries = service.get_expiring_items(inventory_id, query.days).await?;
    Ok(Json(entries))
}

/// List the lots that have been sitting longest
pub async fn oldest_items(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<OldestQuery>,
) -> AppResult<Json<Vec<OldestItemEntry>>> {
    let service = LotService::new(state.db);
    let entries = service
        .get_oldest_items(inventory_id, query.location.as_deref(), query.limit)
        .await?;
    Ok(Json(entries))
}

/// Recompute an item's quantity from its lot ledger.
///
/// Repair endpoint for operators; a healthy item is a no-op.
pub async fn sync_quantity(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let items = ItemService::new(state.db.clone());
    let lots = LotService::new(state.db);

    // Scope check before touching the ledger
    items.get_item(inventory_id, item_id).await?;
    let quantity = lots.sync_item_quantity(item_id).await?;
    Ok(Json(json!({ "item_id": item_id, "quantity": quantity })))
}

/// Text fed to the embedding model for an item
pub(crate) fn embedding_text(name: &str, description: Option<&str>) -> String {
    match description {
        Some(desc) if !desc.trim().is_empty() => format!("{} {}", name, desc),
        _ => name.to_string(),
    }
}

//! HTTP handlers for lot ledger endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{ActiveInventory, CurrentUser};
use crate::models::{ItemLot, Operation, TransactionStatus};
use crate::services::lot::CreateLotInput;
use crate::services::{AuditService, LotService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLotRequest {
    pub quantity: i32,
    pub notes: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReduceLotRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ReduceLotResponse {
    /// The lot after the reduction, absent when it was fully consumed
    pub lot: Option<ItemLot>,
    pub consumed: bool,
}

/// Add a lot of stock to an item
pub async fn create_lot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(item_id): Path<Uuid>,
    Json(input): Json<CreateLotRequest>,
) -> AppResult<(StatusCode, Json<ItemLot>)> {
    let lots = LotService::new(state.db.clone());
    let audit = AuditService::new(state.db);

    let lot = lots
        .create_lot(
            item_id,
            current_user.0.user_id,
            Some(inventory_id),
            CreateLotInput {
                quantity: input.quantity,
                notes: input.notes,
                expiration_date: input.expiration_date,
            },
        )
        .await?;

    audit
        .log_transaction(
            inventory_id,
            Operation::Update,
            Some(item_id),
            Some(json!({ "lot_id": lot.id, "added": lot.quantity })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lot)))
}

/// Remove units from a lot; the lot disappears when fully consumed
pub async fn reduce_lot(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<ReduceLotRequest>,
) -> AppResult<Json<ReduceLotResponse>> {
    let lots = LotService::new(state.db.clone());
    let audit = AuditService::new(state.db);

    let existing = lots.get_lot(inventory_id, lot_id).await?;
    let lot = lots.reduce_lot(lot_id, input.quantity).await?;

    audit
        .log_transaction(
            inventory_id,
            Operation::Update,
            Some(existing.item_id),
            Some(json!({ "lot_id": lot_id, "removed": input.quantity.min(existing.quantity) })),
            TransactionStatus::Confirmed,
        )
        .await?;

    let consumed = lot.is_none();
    Ok(Json(ReduceLotResponse { lot, consumed }))
}

/// Remove a whole lot regardless of its remaining quantity
pub async fn delete_lot(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Path(lot_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let lots = LotService::new(state.db.clone());
    let audit = AuditService::new(state.db);

    let existing = lots.get_lot(inventory_id, lot_id).await?;
    lots.delete_lot(lot_id).await?;

    audit
        .log_transaction(
            inventory_id,
            Operation::Update,
            Some(existing.item_id),
            Some(json!({ "lot_id": lot_id, "removed": existing.quantity })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

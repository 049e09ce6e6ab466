//! HTTP handlers for location endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::ActiveInventory;
use crate::models::{Location, Operation, TransactionStatus};
use crate::services::{AuditService, LocationService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub display_name: Option<String>,
}

/// List the inventory's locations
pub async fn list_locations(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
) -> AppResult<Json<Vec<Location>>> {
    let service = LocationService::new(state.db);
    let locations = service.list_locations(inventory_id).await?;
    Ok(Json(locations))
}

/// Create a location, or return the existing one with the same
/// normalized name
pub async fn create_location(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Json(input): Json<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<Location>)> {
    let service = LocationService::new(state.db.clone());
    let audit = AuditService::new(state.db);

    let location = service
        .get_or_create_location(inventory_id, &input.name, input.display_name.as_deref())
        .await?;

    audit
        .log_transaction(
            inventory_id,
            Operation::CreateLocation,
            None,
            Some(json!({ "name": location.name })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(location)))
}

//! HTTP handlers for inventory and membership endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::EmailClient;
use crate::middleware::CurrentUser;
use crate::models::{Inventory, InventorySummary, MemberInfo};
use crate::services::inventory::AddMemberOutcome;
use crate::services::InventoryService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AddMemberResponse {
    pub status: String,
}

/// List the inventories the user belongs to
pub async fn list_inventories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventorySummary>>> {
    let service = InventoryService::new(state.db);
    let inventories = service.list_inventories(current_user.0.user_id).await?;
    Ok(Json(inventories))
}

/// Create an inventory with the caller as its first member
pub async fn create_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInventoryRequest>,
) -> AppResult<(StatusCode, Json<Inventory>)> {
    let service = InventoryService::new(state.db);
    let inventory = service
        .create_inventory(&input.name, current_user.0.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(inventory)))
}

/// List the members of an inventory the caller belongs to
pub async fn list_members(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<Vec<MemberInfo>>> {
    let service = InventoryService::new(state.db);
    require_membership(&service, inventory_id, current_user.0.user_id).await?;

    let members = service.list_members(inventory_id).await?;
    Ok(Json(members))
}

/// Add a member by email.
///
/// Unknown emails get an invite instead of an error, so the response never
/// reveals whether an account exists.
pub async fn add_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<Json<AddMemberResponse>> {
    let service = InventoryService::new(state.db.clone());
    require_membership(&service, inventory_id, current_user.0.user_id).await?;

    let inventory_name = service
        .list_inventories(current_user.0.user_id)
        .await?
        .into_iter()
        .find(|inv| inv.id == inventory_id)
        .map(|inv| inv.name)
        .unwrap_or_else(|| "a shared inventory".to_string());

    let email = EmailClient::new(
        state.config.email.api_endpoint.clone(),
        state.config.email.api_key.clone(),
        state.config.email.sender.clone(),
        state.config.email.app_url.clone(),
    );

    let status = match service.add_member_by_email(inventory_id, &input.email).await? {
        AddMemberOutcome::Added(_) => {
            email.send_added_email(&input.email, &inventory_name).await;
            "added"
        }
        AddMemberOutcome::AlreadyMember(_) => "already_member",
        AddMemberOutcome::UnknownEmail => {
            email.send_invite_email(&input.email, &inventory_name).await;
            "invited"
        }
    };

    Ok(Json(AddMemberResponse {
        status: status.to_string(),
    }))
}

/// Remove a member from an inventory
pub async fn remove_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((inventory_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let service = InventoryService::new(state.db);
    require_membership(&service, inventory_id, current_user.0.user_id).await?;

    if !service.remove_member(inventory_id, user_id).await? {
        return Err(AppError::NotFound("Membership".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn require_membership(
    service: &InventoryService,
    inventory_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    if !service.is_inventory_member(inventory_id, user_id).await? {
        return Err(AppError::PermissionDenied(
            "Not a member of this inventory".to_string(),
        ));
    }
    Ok(())
}

//! HTTP handlers for notification endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::external::EmailClient;
use crate::middleware::{ActiveInventory, CurrentUser};
use crate::services::LotService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DigestQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct DigestResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
}

/// Email the requesting user a digest of lots expiring within the window
pub async fn send_expiration_digest(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<DigestQuery>,
) -> AppResult<Json<DigestResponse>> {
    let entries = LotService::new(state.db.clone())
        .get_expiring_items(inventory_id, query.days)
        .await?;

    if entries.is_empty() {
        return Ok(Json(DigestResponse {
            status: "no_items".to_string(),
            item_count: None,
        }));
    }

    let email = EmailClient::new(
        state.config.email.api_endpoint.clone(),
        state.config.email.api_key.clone(),
        state.config.email.sender.clone(),
        state.config.email.app_url.clone(),
    );

    if !email
        .send_expiration_digest(&current_user.0.email, &entries)
        .await
    {
        return Err(AppError::ExternalService(
            "Failed to send digest email".to_string(),
        ));
    }

    Ok(Json(DigestResponse {
        status: "sent".to_string(),
        item_count: Some(entries.len()),
    }))
}

//! Transaction log read endpoint for operators

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::ActiveInventory;
use crate::models::TransactionStatus;
use crate::services::AuditService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    100
}

/// GET /api/v1/audit
pub async fn list_transactions(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            TransactionStatus::from_str(s).ok_or_else(|| AppError::Validation {
                field: "status".to_string(),
                message: format!("Unknown status '{}'", s),
            })
        })
        .transpose()?;

    let limit = query.limit.clamp(1, 500);
    let logs = AuditService::new(state.db.clone())
        .get_transaction_logs(inventory_id, limit, status)
        .await?;

    Ok(Json(serde_json::json!({ "transactions": logs })))
}

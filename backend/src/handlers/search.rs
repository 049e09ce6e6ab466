//! HTTP handlers for item search

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::ActiveInventory;
use crate::models::{Operation, SearchResult, TransactionStatus};
use crate::services::search::combine_results;
use crate::services::{AuditService, SearchService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub location: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// Search items by meaning and by substring.
///
/// Semantic matches come first when an embedding provider is configured;
/// plain text matches fill in behind them. Without a provider the text
/// search stands alone.
pub async fn search_items(
    State(state): State<AppState>,
    ActiveInventory(inventory_id): ActiveInventory,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<SearchResult>>> {
    if query.q.trim().is_empty() {
        return Err(AppError::Validation {
            field: "q".to_string(),
            message: "Search query cannot be empty".to_string(),
        });
    }

    let service = SearchService::new(state.db.clone());
    let audit = AuditService::new(state.db.clone());

    let semantic = match state.embedding_client() {
        Some(client) => match client.embed_or_none(query.q.trim()).await {
            Some(embedding) => {
                service
                    .search_items_by_embedding(
                        inventory_id,
                        embedding,
                        query.location.as_deref(),
                        query.limit,
                    )
                    .await?
            }
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    let text = service
        .search_items_by_text(
            inventory_id,
            query.q.trim(),
            query.location.as_deref(),
            query.limit,
        )
        .await?;

    let results = combine_results(semantic, text);

    audit
        .log_transaction(
            inventory_id,
            Operation::Search,
            None,
            Some(json!({ "query": query.q.trim(), "results": results.len() })),
            TransactionStatus::Confirmed,
        )
        .await?;

    Ok(Json(results))
}

//! Natural language chat endpoint
//!
//! With an AI provider configured the assistant answers through chat
//! completions with function calling against the inventory tools. Without
//! one a small pattern matcher covers the read-only questions.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::ai::{ChatMessage, ToolExecutor, ToolSpec};
use crate::middleware::{ActiveInventory, CurrentUser};
use crate::models::{Operation, TransactionStatus};
use crate::services::item::CreateItemInput;
use crate::services::lot::{fifo_plan, CreateLotInput};
use crate::services::{AuditService, ItemService, LocationService, LotService, SearchService};
use crate::AppState;
use shared::validation::possessive_display_name;

const SYSTEM_PROMPT: &str = "You are an inventory management assistant. You help users track \
items stored in various locations like freezers, garages, pantries, closets, and storage bins.\n\n\
Your capabilities:\n\
- Add items to inventory (with name, quantity, category, and location)\n\
- Remove items or reduce quantities\n\
- Search for items using natural language\n\
- List items by location or category\n\
- Report which items have been sitting longest\n\n\
When users describe items naturally, extract the relevant details. For example:\n\
- \"I put 3 bags of frozen chicken in the freezer\" becomes add_item with name=\"frozen chicken bags\", \
quantity=3, category=\"meat\", location=\"Freezer\"\n\
- \"Do I have any batteries?\" becomes search_items with query=\"batteries\"\n\
- \"What's in the garage?\" becomes list_items with location=\"Garage\"\n\
- \"I used 2 of the AA batteries\" means search first, then remove_item with the right quantity\n\n\
Always be helpful and conversational. If you need more information to complete an action, ask the \
user. When reporting search or list results, summarize them naturally rather than just listing raw \
data. If an action succeeds, confirm it in a friendly way.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Process a natural language message about the inventory
pub async fn chat(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ActiveInventory(inventory_id): ActiveInventory,
    Json(input): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let response = if state.config.ai.enabled {
        chat_with_ai(&state, current_user.0.user_id, inventory_id, &input.message).await
    } else {
        chat_fallback(&state, inventory_id, &input.message).await?
    };
    Ok(Json(response))
}

async fn chat_with_ai(
    state: &AppState,
    user_id: Uuid,
    inventory_id: Uuid,
    message: &str,
) -> ChatResponse {
    let Some(client) = state.ai_client() else {
        return ChatResponse {
            response: "The chat assistant is not configured on this server.".to_string(),
            action: "error".to_string(),
            data: None,
        };
    };

    let tools = ChatTools {
        state: state.clone(),
        user_id,
        inventory_id,
    };

    let messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(message),
    ];

    match client.chat_with_tools(messages, &tool_specs(), &tools).await {
        Ok(text) => ChatResponse {
            response: text,
            action: "ai_response".to_string(),
            data: None,
        },
        Err(e) => {
            tracing::error!("AI chat error: {}", e);
            ChatResponse {
                response: "I had trouble processing that request. Try rephrasing or use the \
                           manual interface."
                    .to_string(),
                action: "error".to_string(),
                data: None,
            }
        }
    }
}

/// Tool call handler bound to one user and inventory
struct ChatTools {
    state: AppState,
    user_id: Uuid,
    inventory_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct AddItemArgs {
    name: String,
    quantity: i32,
    category: String,
    location: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveItemArgs {
    item_id: Uuid,
    quantity: Option<i32>,
    lot_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItemsArgs {
    location: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OldestArgs {
    location: Option<String>,
    limit: Option<i64>,
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| crate::error::AppError::ValidationError(format!("Bad tool arguments: {}", e)))
}

#[axum::async_trait]
impl ToolExecutor for ChatTools {
    async fn execute(&self, name: &str, arguments: serde_json::Value) -> AppResult<serde_json::Value> {
        match name {
            "add_item" => self.add_item(parse_args(arguments)?).await,
            "remove_item" => self.remove_item(parse_args(arguments)?).await,
            "search_items" => self.search_items(parse_args(arguments)?).await,
            "list_items" => self.list_items(parse_args(arguments)?).await,
            "list_locations" => self.list_locations().await,
            "get_oldest_items" => self.get_oldest_items(parse_args(arguments)?).await,
            other => Ok(json!({ "success": false, "error": format!("Unknown tool: {}", other) })),
        }
    }
}

impl ChatTools {
    async fn add_item(&self, args: AddItemArgs) -> AppResult<serde_json::Value> {
        let items = ItemService::new(self.state.db.clone());
        let lots = LotService::new(self.state.db.clone());
        let locations = LocationService::new(self.state.db.clone());
        let audit = AuditService::new(self.state.db.clone());

        let display_name = possessive_display_name(args.location.trim());
        let location = locations
            .get_or_create_location(self.inventory_id, args.location.trim(), Some(&display_name))
            .await?;

        let embedding = match self.state.embedding_client() {
            Some(client) => {
                let text = super::item::embedding_text(&args.name, args.description.as_deref());
                client.embed_or_none(&text).await
            }
            None => None,
        };

        audit
            .log_transaction(
                self.inventory_id,
                Operation::Create,
                None,
                Some(json!({
                    "name": args.name,
                    "quantity": args.quantity,
                    "category": args.category,
                    "location": location.name,
                })),
                TransactionStatus::Confirmed,
            )
            .await?;

        // Item starts empty; the lot carries the quantity in
        let item = items
            .create_item(
                self.inventory_id,
                CreateItemInput {
                    name: args.name,
                    quantity: 0,
                    category: args.category,
                    description: args.description,
                    location_id: Some(location.id),
                },
                embedding,
            )
            .await?;

        lots.create_lot(
            item.id,
            self.user_id,
            Some(self.inventory_id),
            CreateLotInput {
                quantity: args.quantity,
                notes: None,
                expiration_date: None,
            },
        )
        .await?;

        Ok(json!({
            "success": true,
            "item": {
                "id": item.id,
                "name": item.name,
                "quantity": args.quantity,
                "category": item.category,
                "location": location.name,
            },
        }))
    }

    async fn remove_item(&self, args: RemoveItemArgs) -> AppResult<serde_json::Value> {
        let items = ItemService::new(self.state.db.clone());
        let lots = LotService::new(self.state.db.clone());
        let audit = AuditService::new(self.state.db.clone());

        let item = match items.get_item(self.inventory_id, args.item_id).await {
            Ok(item) => item,
            Err(_) => {
                return Ok(json!({
                    "success": false,
                    "error": format!("Item {} not found", args.item_id),
                }))
            }
        };

        let item_lots = lots.get_lots_for_item(item.id).await?;

        if let Some(lot_id) = args.lot_id {
            let Some(lot) = item_lots.iter().find(|l| l.id == lot_id) else {
                return Ok(json!({
                    "success": false,
                    "error": format!("Lot {} not found for item {}", lot_id, item.name),
                }));
            };

            let remove_qty = args.quantity.unwrap_or(lot.quantity);
            audit
                .log_transaction(
                    self.inventory_id,
                    Operation::Update,
                    Some(item.id),
                    Some(json!({ "lot_id": lot_id, "quantity_removed": remove_qty })),
                    TransactionStatus::Confirmed,
                )
                .await?;
            lots.reduce_lot(lot_id, remove_qty).await?;

            return Ok(json!({
                "success": true,
                "message": format!(
                    "Removed {} {} from batch dated {}",
                    remove_qty,
                    item.name,
                    lot.added_at.format("%b %d, %Y")
                ),
            }));
        }

        if item_lots.is_empty() {
            // Nothing in the ledger; remove the item itself
            audit
                .log_transaction(
                    self.inventory_id,
                    Operation::Delete,
                    Some(item.id),
                    Some(json!({ "name": item.name })),
                    TransactionStatus::Confirmed,
                )
                .await?;
            items.delete_item(self.inventory_id, item.id).await?;
            return Ok(json!({
                "success": true,
                "message": format!("Removed {}", item.name),
            }));
        }

        // FIFO: consume oldest batches first
        let remove_qty = args.quantity.unwrap_or(item.quantity);
        let plan = fifo_plan(&item_lots, remove_qty);

        let mut removed_from = Vec::new();
        let mut actual_removed = 0;
        for (lot_id, take) in &plan {
            lots.reduce_lot(*lot_id, *take).await?;
            let added_at = item_lots
                .iter()
                .find(|l| l.id == *lot_id)
                .map(|l| l.added_at.format("%b %d, %Y").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            removed_from.push(format!("{} from batch {}", take, added_at));
            actual_removed += take;
        }

        audit
            .log_transaction(
                self.inventory_id,
                Operation::Delete,
                Some(item.id),
                Some(json!({ "name": item.name, "quantity_removed": actual_removed })),
                TransactionStatus::Confirmed,
            )
            .await?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Removed {} {}: {}",
                actual_removed,
                item.name,
                removed_from.join(", ")
            ),
        }))
    }

    async fn search_items(&self, args: SearchArgs) -> AppResult<serde_json::Value> {
        let search = SearchService::new(self.state.db.clone());

        let items: Vec<serde_json::Value> = match self.state.embedding_client() {
            Some(client) => match client.embed_or_none(&args.query).await {
                Some(embedding) => search
                    .search_items_by_embedding(
                        self.inventory_id,
                        embedding,
                        args.location.as_deref(),
                        10,
                    )
                    .await?
                    .into_iter()
                    .map(|(item, _)| summary_json(&item))
                    .collect(),
                None => Vec::new(),
            },
            None => search
                .search_items_by_text(self.inventory_id, &args.query, args.location.as_deref(), 10)
                .await?
                .iter()
                .map(summary_json)
                .collect(),
        };

        Ok(json!({ "success": true, "count": items.len(), "items": items }))
    }

    async fn list_items(&self, args: ListItemsArgs) -> AppResult<serde_json::Value> {
        let items = ItemService::new(self.state.db.clone());
        let lots = LotService::new(self.state.db.clone());

        let listed = items
            .list_items(
                self.inventory_id,
                args.category.as_deref(),
                args.location.as_deref(),
                50,
            )
            .await?;

        let mut result_items = Vec::new();
        for item in &listed {
            let item_lots = lots.get_lots_for_item(item.id).await?;
            let mut entry = summary_json(item);
            if !item_lots.is_empty() {
                entry["lots"] = item_lots
                    .iter()
                    .map(|l| json!({ "lot_id": l.id, "quantity": l.quantity, "added_at": l.added_at }))
                    .collect();
            }
            result_items.push(entry);
        }

        Ok(json!({ "success": true, "count": result_items.len(), "items": result_items }))
    }

    async fn list_locations(&self) -> AppResult<serde_json::Value> {
        let locations = LocationService::new(self.state.db.clone())
            .list_locations(self.inventory_id)
            .await?;

        Ok(json!({
            "success": true,
            "count": locations.len(),
            "locations": locations
                .iter()
                .map(|l| json!({ "id": l.id, "name": l.name }))
                .collect::<Vec<_>>(),
        }))
    }

    async fn get_oldest_items(&self, args: OldestArgs) -> AppResult<serde_json::Value> {
        let oldest = LotService::new(self.state.db.clone())
            .get_oldest_items(
                self.inventory_id,
                args.location.as_deref(),
                args.limit.unwrap_or(10),
            )
            .await?;

        Ok(json!({ "success": true, "count": oldest.len(), "items": oldest }))
    }
}

fn summary_json(item: &crate::models::ItemSummary) -> serde_json::Value {
    json!({
        "id": item.id,
        "name": item.name,
        "quantity": item.quantity,
        "category": item.category,
        "location": item.location,
    })
}

fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::function(
            "add_item",
            "Add a new item to inventory or increase quantity of existing item",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the item (e.g., 'chicken breast', 'AA batteries')" },
                    "quantity": { "type": "integer", "description": "Number of items to add", "minimum": 1 },
                    "category": { "type": "string", "description": "Category for the item (e.g., 'meat', 'electronics', 'vegetables')" },
                    "location": { "type": "string", "description": "Storage location (e.g., 'Freezer', 'Garage', 'Pantry')" },
                    "description": { "type": "string", "description": "Optional description or notes about the item" },
                },
                "required": ["name", "quantity", "category", "location"],
            }),
        ),
        ToolSpec::function(
            "remove_item",
            "Remove an item from inventory or reduce its quantity",
            json!({
                "type": "object",
                "properties": {
                    "item_id": { "type": "string", "description": "ID of the item to remove (from search results)" },
                    "quantity": { "type": "integer", "description": "Number of items to remove. If omitted or greater than current quantity, removes all.", "minimum": 1 },
                    "lot_id": { "type": "string", "description": "Optional: remove from this specific batch instead of oldest first" },
                },
                "required": ["item_id"],
            }),
        ),
        ToolSpec::function(
            "search_items",
            "Search inventory using natural language. Finds items by name, category, description, or location.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query (e.g., 'chicken', 'frozen meat', 'batteries in garage')" },
                    "location": { "type": "string", "description": "Optional: filter to a specific location" },
                },
                "required": ["query"],
            }),
        ),
        ToolSpec::function(
            "list_items",
            "List all items in inventory, optionally filtered by location or category",
            json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "Optional: filter to a specific location (e.g., 'Freezer')" },
                    "category": { "type": "string", "description": "Optional: filter to a specific category (e.g., 'meat')" },
                },
            }),
        ),
        ToolSpec::function(
            "list_locations",
            "List all storage locations",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolSpec::function(
            "get_oldest_items",
            "List the items that have been sitting in storage longest, oldest batch first",
            json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "Optional: filter to a specific location" },
                    "limit": { "type": "integer", "description": "Maximum entries to return", "minimum": 1 },
                },
            }),
        ),
    ]
}

/// Pattern-matching fallback when no AI provider is configured
async fn chat_fallback(
    state: &AppState,
    inventory_id: Uuid,
    message: &str,
) -> AppResult<ChatResponse> {
    let text = message.to_lowercase();
    let text = text.trim();

    let list_intent = ["what's in", "show", "list", "what do i have"]
        .iter()
        .any(|w| text.contains(w));
    let search_intent = ["find", "search", "do i have", "any"]
        .iter()
        .any(|w| text.contains(w));

    if list_intent {
        let location = ["freezer", "garage", "pantry", "closet", "bin", "shelf"]
            .iter()
            .find(|w| text.contains(*w))
            .map(|w| w.to_string());

        let items = ItemService::new(state.db.clone())
            .list_items(inventory_id, None, location.as_deref(), 50)
            .await?;

        let suffix = location
            .as_deref()
            .map(|l| format!(" in {}", l))
            .unwrap_or_default();

        if items.is_empty() {
            return Ok(ChatResponse {
                response: format!("No items found{}.", suffix),
                action: "list".to_string(),
                data: Some(json!({ "count": 0, "items": [] })),
            });
        }

        let item_list = items
            .iter()
            .take(5)
            .map(|i| format!("{}x {}", i.quantity, i.name))
            .collect::<Vec<_>>()
            .join(", ");
        let more = if items.len() > 5 {
            format!(" and {} more", items.len() - 5)
        } else {
            String::new()
        };

        return Ok(ChatResponse {
            response: format!("Found {} items{}: {}{}", items.len(), suffix, item_list, more),
            action: "list".to_string(),
            data: Some(json!({
                "count": items.len(),
                "items": items.iter().map(summary_json).collect::<Vec<_>>(),
            })),
        });
    }

    if search_intent {
        let mut search_terms = text.to_string();
        for word in ["find", "search", "for", "do", "i", "have", "any", "?"] {
            search_terms = search_terms.replace(word, "");
        }
        let search_terms = search_terms.split_whitespace().collect::<Vec<_>>().join(" ");

        if search_terms.is_empty() {
            return Ok(ChatResponse {
                response: "What would you like to search for?".to_string(),
                action: "search".to_string(),
                data: None,
            });
        }

        let results = SearchService::new(state.db.clone())
            .search_items_by_text(inventory_id, &search_terms, None, 5)
            .await?;

        if results.is_empty() {
            return Ok(ChatResponse {
                response: format!("No items found matching '{}'.", search_terms),
                action: "search".to_string(),
                data: Some(json!({ "query": search_terms, "results": [] })),
            });
        }

        let item_list = results
            .iter()
            .map(|i| format!("{}x {}", i.quantity, i.name))
            .collect::<Vec<_>>()
            .join(", ");

        return Ok(ChatResponse {
            response: format!("Found: {}", item_list),
            action: "search".to_string(),
            data: Some(json!({
                "query": search_terms,
                "results": results.iter().map(summary_json).collect::<Vec<_>>(),
            })),
        });
    }

    Ok(ChatResponse {
        response: "I can help you manage your inventory! Try asking:\n\
                   - 'What's in the freezer?'\n\
                   - 'Do I have any batteries?'\n\
                   - 'Show all items'\n\n\
                   Note: the AI assistant is not configured, so adding and removing items \
                   needs the manual interface."
            .to_string(),
        action: "help".to_string(),
        data: None,
    })
}

//! Inventory item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item tracked in an inventory
///
/// `quantity` is a cached sum of the item's lots whenever lots exist and is
/// maintained by every lot mutation. Items with no lots are directly managed
/// and may carry a quantity of their own. `deleted_at` set means the item is
/// in the trash and hidden from all normal queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub description: Option<String>,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Item projection with its location name resolved, for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A search hit with its relevance score (1.0 best, 0.0 worst)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: ItemSummary,
    pub relevance: f64,
}

/// A soft-deleted item as shown in the trash view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashedItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub location: Option<String>,
    pub deleted_at: DateTime<Utc>,
}

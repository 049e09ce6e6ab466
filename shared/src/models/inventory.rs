//! Inventory and membership models
//!
//! An inventory is the sharing boundary: every location, item and lot belongs
//! to exactly one inventory, and users act on it only through a membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named collection of locations and items shared by its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An inventory together with its member count, for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// A user's membership in an inventory
///
/// `(inventory_id, user_id)` is unique; an inventory always has at least one
/// member, and deleting the last member deletes the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMember {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// Membership row joined with the member's email, for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

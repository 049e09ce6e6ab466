//! Storage location models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined storage location within an inventory
///
/// `normalized_name` is the canonical deduplication key:
/// `(inventory_id, normalized_name)` is unique, so "Tim's Pocket" and
/// "tims pocket" resolve to the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub inventory_id: Uuid,
    /// Display name as shown to users
    pub name: String,
    pub normalized_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

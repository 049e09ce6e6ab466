//! Inventory item service: CRUD plus the soft-delete lifecycle
//!
//! Items are never hard-deleted by user action; `delete_item` marks
//! `deleted_at` and every active read path filters it out. The only trash
//! entry point is `list_deleted_items`; recovery is `restore_item`, and hard
//! deletion happens only through `purge_item` / the retention sweep.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{InventoryItem, ItemSummary, TrashedItem};
use shared::types::{PaginationMeta, Pagination};
use shared::validation::normalize_location_name;

/// Item service, always scoped to one inventory per call
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Input for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub quantity: i32,
    pub category: String,
    pub description: Option<String>,
    pub location_id: Option<Uuid>,
}

/// Input for updating an item.
///
/// Quantity is deliberately absent: it is derived from the lot ledger and
/// only changes through lot operations.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    inventory_id: Uuid,
    name: String,
    quantity: i32,
    category: String,
    description: Option<String>,
    location_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for InventoryItem {
    fn from(r: ItemRow) -> Self {
        InventoryItem {
            id: r.id,
            inventory_id: r.inventory_id,
            name: r.name,
            quantity: r.quantity,
            category: r.category,
            description: r.description,
            location_id: r.location_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, inventory_id, name, quantity, category, description, location_id, \
                            created_at, updated_at, deleted_at";

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a new item in the inventory
    pub async fn create_item(
        &self,
        inventory_id: Uuid,
        input: CreateItemInput,
        embedding: Option<Vec<f32>>,
    ) -> AppResult<InventoryItem> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Item name cannot be empty".to_string(),
            });
        }
        if input.quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity cannot be negative".to_string(),
            });
        }

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO inventory_items (inventory_id, name, quantity, category, description, location_id, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(inventory_id)
        .bind(input.name.trim())
        .bind(input.quantity)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.location_id)
        .bind(embedding.map(Vector::from))
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created item {} ({})", row.name, row.id);
        Ok(row.into())
    }

    /// Get an active item by id, scoped to the inventory
    pub async fn get_item(&self, inventory_id: Uuid, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE id = $1 AND inventory_id = $2 AND deleted_at IS NULL
            "#,
        ))
        .bind(item_id)
        .bind(inventory_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(row.into())
    }

    /// List active items with optional category and location-name filters
    pub async fn list_items(
        &self,
        inventory_id: Uuid,
        category: Option<&str>,
        location_name: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<ItemSummary>> {
        let location_filter = location_name.map(normalize_location_name);

        let rows = sqlx::query_as::<_, (Uuid, String, i32, String, Option<String>, Option<String>, DateTime<Utc>)>(
            r#"
            SELECT i.id, i.name, i.quantity, i.category, loc.name, i.description, i.created_at
            FROM inventory_items i
            LEFT JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NULL
              AND ($2::text IS NULL OR i.category = $2)
              AND ($3::text IS NULL OR loc.normalized_name LIKE '%' || $3 || '%')
            ORDER BY i.created_at DESC
            LIMIT $4
            "#,
        )
        .bind(inventory_id)
        .bind(category)
        .bind(location_filter)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ItemSummary {
                id: r.0,
                name: r.1,
                quantity: r.2,
                category: r.3,
                location: r.4,
                description: r.5,
                created_at: r.6,
            })
            .collect())
    }

    /// Update an active item's fields; absent fields keep their values
    pub async fn update_item(
        &self,
        inventory_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
        embedding: Option<Vec<f32>>,
    ) -> AppResult<InventoryItem> {
        let existing = self.get_item(inventory_id, item_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let category = input.category.unwrap_or(existing.category);
        let description = input.description.or(existing.description);
        let location_id = input.location_id.or(existing.location_id);

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET name = $1, category = $2, description = $3, location_id = $4,
                embedding = COALESCE($5, embedding), updated_at = now()
            WHERE id = $6 AND inventory_id = $7 AND deleted_at IS NULL
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&category)
        .bind(&description)
        .bind(location_id)
        .bind(embedding.map(Vector::from))
        .bind(item_id)
        .bind(inventory_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        tracing::info!("Updated item {} ({})", row.name, row.id);
        Ok(row.into())
    }

    /// Move an active item to the trash.
    ///
    /// Returns false when the item is missing or already trashed; deleting
    /// twice is a no-op, not an error.
    pub async fn delete_item(&self, inventory_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND inventory_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(item_id)
        .bind(inventory_id)
        .execute(&self.db)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Soft-deleted item {}", item_id);
        }
        Ok(deleted)
    }

    /// The trash view: soft-deleted items, newest deletion first, paginated
    pub async fn list_deleted_items(
        &self,
        inventory_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<TrashedItem>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_items WHERE inventory_id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(inventory_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, (Uuid, String, i32, String, Option<String>, DateTime<Utc>)>(
            r#"
            SELECT i.id, i.name, i.quantity, i.category, loc.name, i.deleted_at
            FROM inventory_items i
            LEFT JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NOT NULL
            ORDER BY i.deleted_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(inventory_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| TrashedItem {
                id: r.0,
                name: r.1,
                quantity: r.2,
                category: r.3,
                location: r.4,
                deleted_at: r.5,
            })
            .collect();

        Ok((
            items,
            PaginationMeta {
                limit: pagination.limit,
                offset: pagination.offset,
                total_items: total,
            },
        ))
    }

    /// Bring a trashed item back; fails if the item is not currently trashed
    pub async fn restore_item(&self, inventory_id: Uuid, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items SET deleted_at = NULL, updated_at = now()
            WHERE id = $1 AND inventory_id = $2 AND deleted_at IS NOT NULL
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(item_id)
        .bind(inventory_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                tracing::info!("Restored item {} from trash", item_id);
                Ok(row.into())
            }
            None => {
                if self.item_exists(inventory_id, item_id).await? {
                    Err(AppError::InvalidState("Item is not in the trash".to_string()))
                } else {
                    Err(AppError::NotFound("Item".to_string()))
                }
            }
        }
    }

    /// Permanently delete a trashed item.
    ///
    /// Purging an active item is rejected so permanent loss always takes the
    /// two-step delete-then-purge path.
    pub async fn purge_item(&self, inventory_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM inventory_items WHERE id = $1 AND inventory_id = $2 AND deleted_at IS NOT NULL",
        )
        .bind(item_id)
        .bind(inventory_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            if self.item_exists(inventory_id, item_id).await? {
                return Err(AppError::InvalidState(
                    "Item must be deleted before it can be purged".to_string(),
                ));
            }
            return Err(AppError::NotFound("Item".to_string()));
        }

        tracing::info!("Purged item {}", item_id);
        Ok(())
    }

    /// Retention sweep: hard-delete items trashed more than `days` ago.
    ///
    /// Invoked by a cron-style caller; returns the number purged.
    pub async fn purge_old_deleted_items(&self, inventory_id: Uuid, days: i64) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM inventory_items
            WHERE inventory_id = $1 AND deleted_at IS NOT NULL
              AND deleted_at < now() - make_interval(days => $2::int)
            "#,
        )
        .bind(inventory_id)
        .bind(days)
        .execute(&self.db)
        .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::info!("Retention sweep purged {} items from inventory {}", purged, inventory_id);
        }
        Ok(purged)
    }

    async fn item_exists(&self, inventory_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE id = $1 AND inventory_id = $2)",
        )
        .bind(item_id)
        .bind(inventory_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }
}

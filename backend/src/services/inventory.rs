//! Inventory membership service: the authorization gate
//!
//! Every item/location/lot operation is scoped to exactly one inventory, and
//! a user may act only through an inventory they are a member of. Ownership
//! is inventory-level: `user_id` participates in queries only via the
//! membership join, never as a row-owner column.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Inventory, InventoryMember, InventorySummary, MemberInfo};

/// Membership and inventory administration service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Outcome of adding a member by email
#[derive(Debug)]
pub enum AddMemberOutcome {
    /// User existed and was added
    Added(InventoryMember),
    /// User was already a member; the existing membership is returned
    AlreadyMember(InventoryMember),
    /// No account with that email; the caller may send an invite instead
    UnknownEmail,
}

type MemberTuple = (Uuid, Uuid, Uuid, DateTime<Utc>);

fn member_from(r: MemberTuple) -> InventoryMember {
    InventoryMember {
        id: r.0,
        inventory_id: r.1,
        user_id: r.2,
        joined_at: r.3,
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The gate primitive: is this user a member of this inventory?
    pub async fn is_inventory_member(&self, inventory_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_members WHERE inventory_id = $1 AND user_id = $2)",
        )
        .bind(inventory_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    /// Resolve the user's default inventory: the earliest-created inventory
    /// they belong to. A user with no memberships gets one provisioned lazily
    /// (named "{email}'s Inventory", sole member), so no user is ever left
    /// without a scope.
    pub async fn get_default_inventory(&self, user_id: Uuid, email: &str) -> AppResult<Inventory> {
        let existing = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            r#"
            SELECT i.id, i.name, i.created_at
            FROM inventories i
            JOIN inventory_members m ON m.inventory_id = i.id
            WHERE m.user_id = $1
            ORDER BY i.created_at ASC, i.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(r) = existing {
            return Ok(Inventory {
                id: r.0,
                name: r.1,
                created_at: r.2,
            });
        }

        self.create_inventory(&format!("{}'s Inventory", email), user_id)
            .await
    }

    /// Create an inventory with `user_id` as its sole initial member
    pub async fn create_inventory(&self, name: &str, user_id: Uuid) -> AppResult<Inventory> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "INSERT INTO inventories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO inventory_members (inventory_id, user_id) VALUES ($1, $2)")
            .bind(row.0)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Created inventory '{}' ({}) for user {}", row.1, row.0, user_id);
        Ok(Inventory {
            id: row.0,
            name: row.1,
            created_at: row.2,
        })
    }

    /// List the inventories a user belongs to, with member counts
    pub async fn list_inventories(&self, user_id: Uuid) -> AppResult<Vec<InventorySummary>> {
        let rows = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, i64)>(
            r#"
            SELECT i.id, i.name, i.created_at,
                   (SELECT COUNT(*) FROM inventory_members c WHERE c.inventory_id = i.id)
            FROM inventories i
            JOIN inventory_members m ON m.inventory_id = i.id
            WHERE m.user_id = $1
            ORDER BY i.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| InventorySummary {
                id: r.0,
                name: r.1,
                created_at: r.2,
                member_count: r.3,
            })
            .collect())
    }

    /// List members of an inventory with their emails
    pub async fn list_members(&self, inventory_id: Uuid) -> AppResult<Vec<MemberInfo>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            r#"
            SELECT m.id, m.user_id, u.email, m.joined_at
            FROM inventory_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.inventory_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(inventory_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberInfo {
                id: r.0,
                user_id: r.1,
                email: r.2,
                joined_at: r.3,
            })
            .collect())
    }

    /// Add a member by email.
    ///
    /// Idempotent for existing members; an unknown email is reported
    /// distinctly so the caller can send a signup invite instead.
    pub async fn add_member_by_email(
        &self,
        inventory_id: Uuid,
        email: &str,
    ) -> AppResult<AddMemberOutcome> {
        let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        let Some(user_id) = user_id else {
            return Ok(AddMemberOutcome::UnknownEmail);
        };

        let existing = sqlx::query_as::<_, MemberTuple>(
            r#"
            SELECT id, inventory_id, user_id, joined_at
            FROM inventory_members
            WHERE inventory_id = $1 AND user_id = $2
            "#,
        )
        .bind(inventory_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(r) = existing {
            return Ok(AddMemberOutcome::AlreadyMember(member_from(r)));
        }

        let row = sqlx::query_as::<_, MemberTuple>(
            r#"
            INSERT INTO inventory_members (inventory_id, user_id)
            VALUES ($1, $2)
            RETURNING id, inventory_id, user_id, joined_at
            "#,
        )
        .bind(inventory_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Added {} to inventory {}", email, inventory_id);
        Ok(AddMemberOutcome::Added(member_from(row)))
    }

    /// Remove a member. Returns false when no such membership exists; the
    /// repeated-click case is a no-op, not an error.
    ///
    /// Removing the last member deletes the inventory itself, so no
    /// zero-member inventory is ever left behind with unreachable items.
    pub async fn remove_member(&self, inventory_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let member_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_members WHERE inventory_id = $1",
        )
        .bind(inventory_id)
        .fetch_one(&mut *tx)
        .await?;

        let result = sqlx::query(
            "DELETE FROM inventory_members WHERE inventory_id = $1 AND user_id = $2",
        )
        .bind(inventory_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let removed = result.rows_affected() > 0;
        if removed && member_count == 1 {
            Self::delete_inventory_tx(&mut tx, inventory_id).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Delete a user account and unwind their memberships.
    ///
    /// Per inventory: a sole member takes the whole inventory with them
    /// (locations, items, lots and memberships go via FK cascade); in a
    /// shared inventory only this user's membership row is removed and the
    /// inventory survives for the remaining members. Computed per-inventory
    /// inside one transaction. Returns false if the user did not exist.
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let memberships = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT m.inventory_id,
                   (SELECT COUNT(*) FROM inventory_members c WHERE c.inventory_id = m.inventory_id)
            FROM inventory_members m
            WHERE m.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        for (inventory_id, member_count) in memberships {
            if member_count == 1 {
                Self::delete_inventory_tx(&mut tx, inventory_id).await?;
            } else {
                sqlx::query(
                    "DELETE FROM inventory_members WHERE inventory_id = $1 AND user_id = $2",
                )
                .bind(inventory_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Deleted user {}", user_id);
        }
        Ok(deleted)
    }

    async fn delete_inventory_tx(
        tx: &mut Transaction<'_, Postgres>,
        inventory_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM inventories WHERE id = $1")
            .bind(inventory_id)
            .execute(&mut **tx)
            .await?;
        tracing::info!("Deleted inventory {} (last member left)", inventory_id);
        Ok(())
    }
}

//! Lot ledger service
//!
//! Maintains the central consistency contract of the system: for every item
//! that has lots, `item.quantity` equals the sum of its lots' quantities.
//! Every mutation runs the read-modify-write of both the lot row and the
//! parent item row inside one transaction, taking `FOR UPDATE` on the item
//! first so concurrent reductions against the same item serialize.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ExpiringItemEntry, ItemLot, OldestItemEntry};
use shared::validation::normalize_location_name;

/// Lot service for ledger mutations and age/expiration queries
#[derive(Clone)]
pub struct LotService {
    db: PgPool,
}

/// Input for creating a lot
#[derive(Debug, Deserialize)]
pub struct CreateLotInput {
    pub quantity: i32,
    pub notes: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct LotRow {
    id: Uuid,
    item_id: Uuid,
    quantity: i32,
    added_at: DateTime<Utc>,
    added_by_user_id: Option<Uuid>,
    notes: Option<String>,
    expiration_date: Option<NaiveDate>,
}

impl From<LotRow> for ItemLot {
    fn from(r: LotRow) -> Self {
        ItemLot {
            id: r.id,
            item_id: r.item_id,
            quantity: r.quantity,
            added_at: r.added_at,
            added_by_user_id: r.added_by_user_id,
            notes: r.notes,
            expiration_date: r.expiration_date,
        }
    }
}

/// Plan a FIFO consumption of `quantity` units across `lots`.
///
/// Lots must already be sorted oldest first (the `get_lots_for_item`
/// ordering). Returns `(lot_id, take)` pairs; the taken total is
/// `min(quantity, sum of lots)` and no lot is drawn past its own quantity.
pub fn fifo_plan(lots: &[ItemLot], quantity: i32) -> Vec<(Uuid, i32)> {
    let mut remaining = quantity;
    let mut plan = Vec::new();
    for lot in lots {
        if remaining <= 0 {
            break;
        }
        let take = remaining.min(lot.quantity);
        if take > 0 {
            plan.push((lot.id, take));
            remaining -= take;
        }
    }
    plan
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add one batch of stock to an item.
    ///
    /// The parent item must be active. When `inventory_id` is given the item
    /// must also belong to that inventory; a mismatch reports `NotFound`, the
    /// same as a missing item, so existence is never confirmed across
    /// tenants. The item's cached quantity is incremented in the same
    /// transaction that persists the lot.
    pub async fn create_lot(
        &self,
        item_id: Uuid,
        added_by: Uuid,
        inventory_id: Option<Uuid>,
        input: CreateLotInput,
    ) -> AppResult<ItemLot> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Lot quantity must be a positive integer".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let item = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM inventory_items
            WHERE id = $1 AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR inventory_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .bind(inventory_id)
        .fetch_optional(&mut *tx)
        .await?;

        if item.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let lot = sqlx::query_as::<_, LotRow>(
            r#"
            INSERT INTO item_lots (item_id, quantity, added_by_user_id, notes, expiration_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, item_id, quantity, added_at, added_by_user_id, notes, expiration_date
            "#,
        )
        .bind(item_id)
        .bind(input.quantity)
        .bind(added_by)
        .bind(&input.notes)
        .bind(input.expiration_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE inventory_items SET quantity = quantity + $1, updated_at = now() WHERE id = $2",
        )
        .bind(input.quantity)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Created lot {} for item {} (+{})", lot.id, item_id, lot.quantity);
        Ok(lot.into())
    }

    /// Get all lots for an item, oldest first.
    ///
    /// The ascending `added_at` ordering is the FIFO consumption contract
    /// removal flows rely on.
    pub async fn get_lots_for_item(&self, item_id: Uuid) -> AppResult<Vec<ItemLot>> {
        let rows = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT id, item_id, quantity, added_at, added_by_user_id, notes, expiration_date
            FROM item_lots
            WHERE item_id = $1
            ORDER BY added_at ASC, id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ItemLot::from).collect())
    }

    /// Get one lot, scoped to an inventory through its parent item
    pub async fn get_lot(&self, inventory_id: Uuid, lot_id: Uuid) -> AppResult<ItemLot> {
        let row = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT l.id, l.item_id, l.quantity, l.added_at, l.added_by_user_id, l.notes, l.expiration_date
            FROM item_lots l
            JOIN inventory_items i ON i.id = l.item_id
            WHERE l.id = $1 AND i.inventory_id = $2
            "#,
        )
        .bind(lot_id)
        .bind(inventory_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        Ok(row.into())
    }

    /// Remove up to `quantity` units from a lot.
    ///
    /// If the requested amount meets or exceeds the lot's remaining quantity
    /// the lot is deleted, the item is debited by the amount actually held,
    /// and `None` is returned. Otherwise both the lot and the item shrink by
    /// exactly `quantity` and the smaller lot is returned. An item left with
    /// zero lots is considered consumed and is soft-deleted in the same
    /// transaction.
    pub async fn reduce_lot(&self, lot_id: Uuid, quantity: i32) -> AppResult<Option<ItemLot>> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Reduction quantity must be a positive integer".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let (item_id, lot_quantity) = Self::lock_lot_and_item(&mut tx, lot_id).await?;

        let result = if quantity >= lot_quantity {
            // The whole lot goes; only the amount the lot actually held
            // comes off the item.
            sqlx::query("DELETE FROM item_lots WHERE id = $1")
                .bind(lot_id)
                .execute(&mut *tx)
                .await?;

            Self::debit_item(&mut tx, item_id, lot_quantity).await?;
            Self::retire_item_if_lotless(&mut tx, item_id).await?;
            None
        } else {
            let lot = sqlx::query_as::<_, LotRow>(
                r#"
                UPDATE item_lots SET quantity = quantity - $1
                WHERE id = $2
                RETURNING id, item_id, quantity, added_at, added_by_user_id, notes, expiration_date
                "#,
            )
            .bind(quantity)
            .bind(lot_id)
            .fetch_one(&mut *tx)
            .await?;

            Self::debit_item(&mut tx, item_id, quantity).await?;
            Some(lot.into())
        };

        tx.commit().await?;

        tracing::info!("Reduced lot {} by {} (item {})", lot_id, quantity.min(lot_quantity), item_id);
        Ok(result)
    }

    /// Unconditionally remove a lot, debiting its full quantity from the item
    pub async fn delete_lot(&self, lot_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let (item_id, lot_quantity) = Self::lock_lot_and_item(&mut tx, lot_id).await?;

        sqlx::query("DELETE FROM item_lots WHERE id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await?;

        Self::debit_item(&mut tx, item_id, lot_quantity).await?;
        Self::retire_item_if_lotless(&mut tx, item_id).await?;

        tx.commit().await?;

        tracing::info!("Deleted lot {} (item {}, -{})", lot_id, item_id, lot_quantity);
        Ok(())
    }

    /// Recompute an item's cached quantity from its lots.
    ///
    /// Repair operation, not part of the hot path: overwrites the cache with
    /// `SUM(lot.quantity)`, treating no lots as zero, and returns the new
    /// value.
    pub async fn sync_item_quantity(&self, item_id: Uuid) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0) FROM item_lots WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        let total = i32::try_from(total)
            .map_err(|_| AppError::Consistency(format!("Lot sum overflow for item {}", item_id)))?;

        sqlx::query("UPDATE inventory_items SET quantity = $1, updated_at = now() WHERE id = $2")
            .bind(total)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Synced quantity for item {} to {}", item_id, total);
        Ok(total)
    }

    /// Get the longest-sitting lots in an inventory, oldest first.
    ///
    /// Joins lot, item and location; items without an assigned location do
    /// not appear (inner join, matching the original product behavior). The
    /// optional location filter is a substring match on normalized names.
    pub async fn get_oldest_items(
        &self,
        inventory_id: Uuid,
        location_name: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<OldestItemEntry>> {
        let location_filter = location_name.map(normalize_location_name);

        let rows = sqlx::query_as::<_, (Uuid, String, String, String, Uuid, i32, DateTime<Utc>, Option<NaiveDate>)>(
            r#"
            SELECT i.id, i.name, i.category, loc.name, l.id, l.quantity, l.added_at, l.expiration_date
            FROM item_lots l
            JOIN inventory_items i ON i.id = l.item_id
            JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NULL
              AND ($2::text IS NULL OR loc.normalized_name LIKE '%' || $2 || '%')
            ORDER BY l.added_at ASC
            LIMIT $3
            "#,
        )
        .bind(inventory_id)
        .bind(location_filter)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OldestItemEntry {
                item_id: r.0,
                name: r.1,
                category: r.2,
                location: r.3,
                lot_id: r.4,
                lot_quantity: r.5,
                added_at: r.6,
                expiration_date: r.7,
            })
            .collect())
    }

    /// Get lots expiring within `days` days, soonest first.
    ///
    /// `days_until_expiry` is zero or negative for lots already expired.
    pub async fn get_expiring_items(
        &self,
        inventory_id: Uuid,
        days: i64,
    ) -> AppResult<Vec<ExpiringItemEntry>> {
        let today = Utc::now().date_naive();
        let cutoff = today + chrono::Duration::days(days);

        let rows = sqlx::query_as::<_, (Uuid, String, String, Option<String>, Uuid, i32, NaiveDate)>(
            r#"
            SELECT i.id, i.name, i.category, loc.name, l.id, l.quantity, l.expiration_date
            FROM item_lots l
            JOIN inventory_items i ON i.id = l.item_id
            LEFT JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NULL
              AND l.expiration_date IS NOT NULL
              AND l.expiration_date <= $2
              AND l.quantity > 0
            ORDER BY l.expiration_date ASC
            "#,
        )
        .bind(inventory_id)
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExpiringItemEntry {
                item_id: r.0,
                name: r.1,
                category: r.2,
                location: r.3,
                lot_id: r.4,
                lot_quantity: r.5,
                expiration_date: r.6,
                days_until_expiry: (r.6 - today).num_days(),
            })
            .collect())
    }

    /// Lock the parent item row, then re-read the lot under the lock.
    ///
    /// Lock order (item before lot) is fixed across all ledger mutations to
    /// keep concurrent reductions on the same item deadlock-free. Returns
    /// `(item_id, lot_quantity)`.
    async fn lock_lot_and_item(
        tx: &mut Transaction<'_, Postgres>,
        lot_id: Uuid,
    ) -> AppResult<(Uuid, i32)> {
        let item_id = sqlx::query_scalar::<_, Uuid>("SELECT item_id FROM item_lots WHERE id = $1")
            .bind(lot_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;

        if locked.is_none() {
            return Err(AppError::Consistency(format!(
                "Lot {} references missing item {}",
                lot_id, item_id
            )));
        }

        // Re-read under the item lock; a concurrent reducer may have
        // consumed the lot between the first read and here.
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM item_lots WHERE id = $1 FOR UPDATE",
        )
        .bind(lot_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        Ok((item_id, quantity))
    }

    async fn debit_item(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        amount: i32,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE inventory_items SET quantity = quantity - $1, updated_at = now() WHERE id = $2",
        )
        .bind(amount)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Soft-delete the item when its last lot is gone.
    ///
    /// A zero-lot item is considered consumed. This is application logic, not
    /// a foreign-key cascade (the FK cascade runs the other way, lots with
    /// their item), and it runs inside the caller's transaction.
    async fn retire_item_if_lotless(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
    ) -> AppResult<()> {
        let remaining = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM item_lots WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_one(&mut **tx)
        .await?;

        if remaining == 0 {
            sqlx::query(
                "UPDATE inventory_items SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(item_id)
            .execute(&mut **tx)
            .await?;
            tracing::info!("Item {} consumed (last lot removed), moved to trash", item_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use chrono::Utc;
    use proptest::prelude::*;

    fn lot(quantity: i32, age_days: i64) -> ItemLot {
        ItemLot {
            id: Uuid::new_v4(),
            item_id: Uuid::nil(),
            quantity,
            added_at: Utc::now() - Duration::days(age_days),
            added_by_user_id: None,
            notes: None,
            expiration_date: None,
        }
    }

    #[test]
    fn fifo_takes_from_the_first_lot_when_it_covers_the_request() {
        let lots = vec![lot(10, 30), lot(5, 10)];
        let plan = fifo_plan(&lots, 4);
        assert_eq!(plan, vec![(lots[0].id, 4)]);
    }

    #[test]
    fn fifo_spans_lots_in_order() {
        let lots = vec![lot(3, 30), lot(5, 20), lot(7, 10)];
        let plan = fifo_plan(&lots, 9);
        assert_eq!(
            plan,
            vec![(lots[0].id, 3), (lots[1].id, 5), (lots[2].id, 1)]
        );
    }

    #[test]
    fn fifo_caps_at_available_stock() {
        let lots = vec![lot(2, 5), lot(3, 1)];
        let plan = fifo_plan(&lots, 100);
        let taken: i32 = plan.iter().map(|(_, t)| t).sum();
        assert_eq!(taken, 5);
    }

    #[test]
    fn fifo_takes_nothing_for_nonpositive_requests() {
        let lots = vec![lot(4, 1)];
        assert!(fifo_plan(&lots, 0).is_empty());
        assert!(fifo_plan(&lots, -3).is_empty());
    }

    #[test]
    fn fifo_takes_nothing_from_no_lots() {
        assert!(fifo_plan(&[], 10).is_empty());
    }

    proptest! {
        #[test]
        fn fifo_never_overdraws_any_lot(
            quantities in proptest::collection::vec(1i32..=100, 0..6),
            request in 0i32..500,
        ) {
            let lots: Vec<ItemLot> = quantities
                .iter()
                .enumerate()
                .map(|(i, &q)| lot(q, (quantities.len() - i) as i64))
                .collect();
            let plan = fifo_plan(&lots, request);

            for (lot_id, take) in &plan {
                let source = lots.iter().find(|l| l.id == *lot_id).unwrap();
                prop_assert!(*take >= 1);
                prop_assert!(*take <= source.quantity);
            }

            let available: i32 = quantities.iter().sum();
            let taken: i32 = plan.iter().map(|(_, t)| t).sum();
            prop_assert_eq!(taken, request.min(available).max(0));
        }

        #[test]
        fn fifo_only_touches_a_lot_once_and_in_order(
            quantities in proptest::collection::vec(1i32..=50, 1..6),
            request in 1i32..300,
        ) {
            let lots: Vec<ItemLot> = quantities
                .iter()
                .map(|&q| lot(q, 0))
                .collect();
            let plan = fifo_plan(&lots, request);

            let order: Vec<usize> = plan
                .iter()
                .map(|(id, _)| lots.iter().position(|l| l.id == *id).unwrap())
                .collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(&order, &sorted);

            // Every lot before the last one drawn is drained completely
            for window in order.windows(2) {
                let (_, take) = plan.iter().find(|(id, _)| *id == lots[window[0]].id).unwrap();
                prop_assert_eq!(*take, lots[window[0]].quantity);
            }
        }
    }
}

//! Item lot models
//!
//! A lot is one dated batch of stock added to an item. Lots are the atomic
//! unit of the quantity ledger: the parent item's quantity is the sum of its
//! lots, and removal flows consume lots oldest-first (FIFO).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One batch of stock added to an item
///
/// A lot's quantity is strictly positive for as long as the lot exists; a
/// reduction that would reach zero deletes the lot instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLot {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    pub added_by_user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

/// One row of the "what's been sitting longest" projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OldestItemEntry {
    pub item_id: Uuid,
    pub name: String,
    pub category: String,
    pub location: String,
    pub lot_id: Uuid,
    pub lot_quantity: i32,
    pub added_at: DateTime<Utc>,
    pub expiration_date: Option<NaiveDate>,
}

/// One row of the expiring-items projection
///
/// `days_until_expiry` may be zero or negative for lots already expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringItemEntry {
    pub item_id: Uuid,
    pub name: String,
    pub category: String,
    pub location: Option<String>,
    pub lot_id: Uuid,
    pub lot_quantity: i32,
    pub expiration_date: NaiveDate,
    pub days_until_expiry: i64,
}

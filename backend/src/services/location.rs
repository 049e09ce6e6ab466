//! Location resolver service
//!
//! Maps free-text location names to one canonical row per inventory via the
//! `(inventory_id, normalized_name)` uniqueness key.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Location;
use shared::validation::{default_display_name, normalize_location_name};

/// Location service
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

type LocationTuple = (Uuid, Uuid, String, String, Option<String>, DateTime<Utc>);

fn location_from(r: LocationTuple) -> Location {
    Location {
        id: r.0,
        inventory_id: r.1,
        name: r.2,
        normalized_name: r.3,
        description: r.4,
        created_at: r.5,
    }
}

const LOCATION_COLUMNS: &str = "id, inventory_id, name, normalized_name, description, created_at";

impl LocationService {
    /// Create a new LocationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve a free-text name to the canonical location, creating it on
    /// first use.
    ///
    /// An existing row wins unchanged: repeated creation with different
    /// casing or punctuation does not rename it. For new rows the display
    /// name is a title-cased version of the input unless the caller supplies
    /// a nicer one.
    pub async fn get_or_create_location(
        &self,
        inventory_id: Uuid,
        name: &str,
        display_name: Option<&str>,
    ) -> AppResult<Location> {
        let normalized = normalize_location_name(name);
        if normalized.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Location name cannot be empty".to_string(),
            });
        }

        if let Some(existing) = self.find_by_normalized(inventory_id, &normalized).await? {
            return Ok(existing);
        }

        let display = match display_name {
            Some(d) if !d.trim().is_empty() => d.trim().to_string(),
            _ => default_display_name(name.trim()),
        };

        // Two concurrent first uses race on the unique key; DO NOTHING and
        // re-select so both land on the same row.
        let inserted = sqlx::query_as::<_, LocationTuple>(&format!(
            r#"
            INSERT INTO locations (inventory_id, name, normalized_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (inventory_id, normalized_name) DO NOTHING
            RETURNING {LOCATION_COLUMNS}
            "#,
        ))
        .bind(inventory_id)
        .bind(&display)
        .bind(&normalized)
        .fetch_optional(&self.db)
        .await?;

        if let Some(r) = inserted {
            tracing::info!("Created location '{}' in inventory {}", r.2, inventory_id);
            return Ok(location_from(r));
        }

        self.find_by_normalized(inventory_id, &normalized)
            .await?
            .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }

    /// List an inventory's locations alphabetically
    pub async fn list_locations(&self, inventory_id: Uuid) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationTuple>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE inventory_id = $1
            ORDER BY name ASC
            "#,
        ))
        .bind(inventory_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(location_from).collect())
    }

    async fn find_by_normalized(
        &self,
        inventory_id: Uuid,
        normalized: &str,
    ) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationTuple>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE inventory_id = $1 AND normalized_name = $2
            "#,
        ))
        .bind(inventory_id)
        .bind(normalized)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(location_from))
    }
}

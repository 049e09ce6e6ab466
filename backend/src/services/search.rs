//! Search service: text and vector similarity search over items
//!
//! Both paths are inventory-scoped and exclude trashed items. The combining
//! strategy used by the search endpoint lives here as a pure function so the
//! handler and the tests share it.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ItemSummary, SearchResult};
use shared::validation::normalize_location_name;

/// Relevance assigned to matches found only by text search
pub const TEXT_MATCH_RELEVANCE: f64 = 0.5;

/// Search service
#[derive(Clone)]
pub struct SearchService {
    db: PgPool,
}

type SummaryTuple = (Uuid, String, i32, String, Option<String>, Option<String>, DateTime<Utc>);

fn summary_from(r: SummaryTuple) -> ItemSummary {
    ItemSummary {
        id: r.0,
        name: r.1,
        quantity: r.2,
        category: r.3,
        location: r.4,
        description: r.5,
        created_at: r.6,
    }
}

/// Map an L2 distance to a 0..1 similarity score
pub fn distance_to_similarity(distance: f64) -> f64 {
    (1.0 - distance / 2.0).max(0.0)
}

/// Merge semantic and text results for the search endpoint.
///
/// De-duplicates by item id, preferring the embedding similarity score;
/// text-only matches are appended with a fixed fallback relevance.
pub fn combine_results(
    semantic: Vec<(ItemSummary, f64)>,
    text: Vec<ItemSummary>,
) -> Vec<SearchResult> {
    let mut seen = std::collections::HashSet::new();
    let mut results = Vec::new();

    for (item, distance) in semantic {
        if seen.insert(item.id) {
            results.push(SearchResult {
                relevance: distance_to_similarity(distance),
                item,
            });
        }
    }

    for item in text {
        if seen.insert(item.id) {
            results.push(SearchResult {
                relevance: TEXT_MATCH_RELEVANCE,
                item,
            });
        }
    }

    results
}

impl SearchService {
    /// Create a new SearchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Case-insensitive substring search against item name or description
    pub async fn search_items_by_text(
        &self,
        inventory_id: Uuid,
        query: &str,
        location_name: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<ItemSummary>> {
        let location_filter = location_name.map(normalize_location_name);

        let rows = sqlx::query_as::<_, SummaryTuple>(
            r#"
            SELECT i.id, i.name, i.quantity, i.category, loc.name, i.description, i.created_at
            FROM inventory_items i
            LEFT JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NULL
              AND (i.name ILIKE '%' || $2 || '%' OR i.description ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR loc.normalized_name LIKE '%' || $3 || '%')
            ORDER BY i.created_at DESC
            LIMIT $4
            "#,
        )
        .bind(inventory_id)
        .bind(query)
        .bind(location_filter)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(summary_from).collect())
    }

    /// Vector similarity search over items that have a stored embedding,
    /// nearest (smallest L2 distance) first
    pub async fn search_items_by_embedding(
        &self,
        inventory_id: Uuid,
        query_embedding: Vec<f32>,
        location_name: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<(ItemSummary, f64)>> {
        let location_filter = location_name.map(normalize_location_name);

        let rows = sqlx::query_as::<_, (Uuid, String, i32, String, Option<String>, Option<String>, DateTime<Utc>, f64)>(
            r#"
            SELECT i.id, i.name, i.quantity, i.category, loc.name, i.description, i.created_at,
                   i.embedding <-> $2 AS distance
            FROM inventory_items i
            LEFT JOIN locations loc ON loc.id = i.location_id
            WHERE i.inventory_id = $1 AND i.deleted_at IS NULL
              AND i.embedding IS NOT NULL
              AND ($3::text IS NULL OR loc.normalized_name LIKE '%' || $3 || '%')
            ORDER BY distance ASC
            LIMIT $4
            "#,
        )
        .bind(inventory_id)
        .bind(Vector::from(query_embedding))
        .bind(location_filter)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (summary_from((r.0, r.1, r.2, r.3, r.4, r.5, r.6)), r.7))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn item(id: Uuid, name: &str) -> ItemSummary {
        ItemSummary {
            id,
            name: name.to_string(),
            quantity: 1,
            category: "misc".to_string(),
            location: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn similarity_maps_distance_onto_unit_interval() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert_eq!(distance_to_similarity(1.0), 0.5);
        assert_eq!(distance_to_similarity(2.0), 0.0);
        // Distances past 2 clamp instead of going negative
        assert_eq!(distance_to_similarity(3.5), 0.0);
    }

    #[test]
    fn semantic_score_wins_over_text_fallback_for_the_same_item() {
        let id = Uuid::new_v4();
        let results = combine_results(
            vec![(item(id, "flour"), 0.4)],
            vec![item(id, "flour")],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relevance, distance_to_similarity(0.4));
    }

    #[test]
    fn text_only_matches_get_the_fixed_relevance() {
        let results = combine_results(Vec::new(), vec![item(Uuid::new_v4(), "flour")]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relevance, TEXT_MATCH_RELEVANCE);
    }

    #[test]
    fn semantic_results_come_first() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let results = combine_results(
            vec![(item(a, "rice"), 0.2)],
            vec![item(b, "rice cooker")],
        );
        assert_eq!(results[0].item.id, a);
        assert_eq!(results[1].item.id, b);
    }

    proptest! {
        #[test]
        fn combined_results_have_unique_ids(
            semantic_count in 0usize..8,
            text_count in 0usize..8,
            shared_count in 0usize..4,
        ) {
            let shared_ids: Vec<Uuid> = (0..shared_count).map(|_| Uuid::new_v4()).collect();

            let mut semantic: Vec<(ItemSummary, f64)> = (0..semantic_count)
                .map(|i| (item(Uuid::new_v4(), &format!("s{}", i)), 0.5))
                .collect();
            let mut text: Vec<ItemSummary> = (0..text_count)
                .map(|i| item(Uuid::new_v4(), &format!("t{}", i)))
                .collect();
            for id in &shared_ids {
                semantic.push((item(*id, "both"), 0.3));
                text.push(item(*id, "both"));
            }

            let results = combine_results(semantic, text);
            let mut ids: Vec<Uuid> = results.iter().map(|r| r.item.id).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), results.len());
            prop_assert_eq!(results.len(), semantic_count + text_count + shared_count);
        }

        #[test]
        fn relevance_is_always_in_unit_interval(distance in 0.0f64..10.0) {
            let s = distance_to_similarity(distance);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}

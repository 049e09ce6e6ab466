//! Location name resolution tests
//!
//! Tests for the normalization rules that make differently-typed location
//! names resolve to the same row, and the display-name heuristics.

use proptest::prelude::*;
use shared::validation::{default_display_name, normalize_location_name, possessive_display_name};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn apostrophes_and_case_do_not_split_locations() {
        // "Tim's Pocket" and "tims pocket" are the same place
        assert_eq!(
            normalize_location_name("Tim's Pocket"),
            normalize_location_name("tims pocket")
        );
    }

    #[test]
    fn punctuation_variants_collapse() {
        for variant in ["chest freezer", "Chest Freezer!", "  chest   freezer  ", "chest freezer."] {
            assert_eq!(normalize_location_name(variant), "chest freezer");
        }
    }

    #[test]
    fn hyphens_are_stripped_not_spaced() {
        assert_eq!(normalize_location_name("chest-freezer"), "chestfreezer");
    }

    #[test]
    fn purely_punctuation_names_normalize_to_empty() {
        assert_eq!(normalize_location_name("?!',"), "");
        assert_eq!(normalize_location_name("   "), "");
    }

    #[test]
    fn default_display_name_title_cases() {
        assert_eq!(default_display_name("top shelf"), "Top Shelf");
    }

    #[test]
    fn possessive_heuristic_restores_the_apostrophe() {
        assert_eq!(possessive_display_name("tims pocket"), "Tim's Pocket");
        assert_eq!(possessive_display_name("bobs garage shelf"), "Bob's Garage Shelf");
        // Words that merely end in s stay untouched when last
        assert_eq!(possessive_display_name("downstairs"), "Downstairs");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn location_name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z'\\-_.,!? ]{1,30}"
    }

    proptest! {
        /// Normalizing twice gives the same result as normalizing once.
        #[test]
        fn normalization_is_idempotent(name in location_name_strategy()) {
            let once = normalize_location_name(&name);
            prop_assert_eq!(normalize_location_name(&once), once);
        }

        /// Output is lowercase and has no stripped punctuation or doubled
        /// spaces left.
        #[test]
        fn normalized_output_is_canonical(name in location_name_strategy()) {
            let normalized = normalize_location_name(&name);
            prop_assert!(!normalized.chars().any(|c| c.is_uppercase()));
            prop_assert!(!normalized.chars().any(|c| "'\"-_.,!?".contains(c)));
            prop_assert!(!normalized.contains("  "));
            prop_assert_eq!(normalized.trim(), &normalized);
        }

        /// Case differences never produce different normal forms.
        #[test]
        fn normalization_is_case_insensitive(name in location_name_strategy()) {
            prop_assert_eq!(
                normalize_location_name(&name.to_uppercase()),
                normalize_location_name(&name.to_lowercase())
            );
        }

        /// A display name never changes which location the name resolves to.
        #[test]
        fn display_names_normalize_back_to_the_same_row(name in "[a-z]{2,10}( [a-z]{2,10}){0,2}") {
            let possessive = possessive_display_name(&name);
            let default = default_display_name(&name);
            prop_assert_eq!(
                normalize_location_name(&possessive),
                normalize_location_name(&name)
            );
            prop_assert_eq!(
                normalize_location_name(&default),
                normalize_location_name(&name)
            );
        }
    }
}

//! Validation and normalization utilities for the Larder platform
//!
//! Domain-level checks shared by the backend services and any tooling.

// ============================================================================
// Location Name Normalization
// ============================================================================

/// Characters stripped during location-name normalization
const STRIPPED_CHARS: &[char] = &['\'', '"', '-', '_', '.', ',', '!', '?'];

/// Canonicalize a location name for deduplication.
///
/// Lowercase, strip `'"-_.,!?`, collapse whitespace runs to a single space,
/// trim. Two names normalizing to the same string must resolve to the same
/// location row.
pub fn normalize_location_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Default display name for a new location: first letter of each word
/// uppercased, the rest kept as typed.
pub fn default_display_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display name with a possessive heuristic, for locations created through
/// free text. A word ending in a single `s` followed by another word is
/// treated as a possessive name: "tims pocket" becomes "Tim's Pocket".
pub fn possessive_display_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            let base = lower.strip_suffix('s').unwrap_or("");
            if i < last
                && lower.len() >= 3
                && !lower.ends_with("ss")
                && !base.is_empty()
                && base.chars().all(|c| c.is_ascii_alphabetic())
            {
                format!("{}'s", default_display_name(base))
            } else {
                default_display_name(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password complexity
///
/// Requires at least 8 characters with one uppercase letter, one lowercase
/// letter, one digit and one special character.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number");
    }
    if !password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        return Err("Password must contain a special character");
    }
    Ok(())
}

/// Validate a lot or item quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_case_punctuation_and_whitespace() {
        assert_eq!(normalize_location_name("Tim's Pocket"), "tims pocket");
        assert_eq!(normalize_location_name("tims pocket"), "tims pocket");
        assert_eq!(normalize_location_name("  TOP   SHELF!  "), "top shelf");
        assert_eq!(normalize_location_name("chest-freezer, garage"), "chestfreezer garage");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_location_name("Tim's  Pocket?");
        assert_eq!(normalize_location_name(&once), once);
    }

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(default_display_name("top shelf"), "Top Shelf");
        assert_eq!(default_display_name("  garage  freezer "), "Garage Freezer");
    }

    #[test]
    fn possessive_names_get_an_apostrophe() {
        assert_eq!(possessive_display_name("tims pocket"), "Tim's Pocket");
        assert_eq!(possessive_display_name("garage"), "Garage");
        // Trailing word never treated as possessive
        assert_eq!(possessive_display_name("downstairs"), "Downstairs");
        // Double-s words are not names
        assert_eq!(possessive_display_name("glass cabinet"), "Glass Cabinet");
    }

    #[test]
    fn password_complexity_enforced() {
        assert!(validate_password("Abcdef1!").is_ok());
        assert!(validate_password("short1!").is_err());
        assert!(validate_password("nouppercase1!").is_err());
        assert!(validate_password("NOLOWERCASE1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial11").is_err());
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    proptest::proptest! {
        #[test]
        fn normalized_names_never_contain_stripped_characters(name in ".{0,40}") {
            let normalized = normalize_location_name(&name);
            proptest::prop_assert!(!normalized.chars().any(|c| STRIPPED_CHARS.contains(&c)));
        }
    }
}

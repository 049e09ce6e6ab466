//! Account validation tests
//!
//! Tests for the registration-time checks:
//! - Password complexity rules
//! - Email format validation

use proptest::prelude::*;
use shared::validation::{validate_email, validate_password};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn strong_passwords_pass() {
        for p in ["Abcdef1!", "Sup3r$ecret", "XyZ9@abcd", "P@ssw0rd with spaces"] {
            assert!(validate_password(p).is_ok(), "{} should pass", p);
        }
    }

    #[test]
    fn each_missing_class_is_reported() {
        assert_eq!(
            validate_password("Ab1!"),
            Err("Password must be at least 8 characters")
        );
        assert_eq!(
            validate_password("alllower1!"),
            Err("Password must contain an uppercase letter")
        );
        assert_eq!(
            validate_password("ALLUPPER1!"),
            Err("Password must contain a lowercase letter")
        );
        assert_eq!(
            validate_password("NoDigitsHere!"),
            Err("Password must contain a number")
        );
        assert_eq!(
            validate_password("NoSpecial123"),
            Err("Password must contain a special character")
        );
    }

    #[test]
    fn email_needs_at_sign_dot_and_length() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@dot").is_err());
        assert!(validate_email("a@b").is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Anything shorter than 8 characters fails regardless of content.
        #[test]
        fn short_passwords_always_fail(password in ".{0,7}") {
            prop_assert!(validate_password(&password).is_err());
        }

        /// Passwords built with all four classes always pass.
        #[test]
        fn passwords_with_all_classes_pass(
            upper in "[A-Z]{1,5}",
            lower in "[a-z]{1,5}",
            digit in "[0-9]{1,5}",
            special in "[!@#$%^&*]{1,3}",
        ) {
            let password = format!("{}{}{}{}", upper, lower, digit, special);
            prop_assume!(password.len() >= 8);
            prop_assert!(validate_password(&password).is_ok());
        }

        /// Generated well-formed addresses validate.
        #[test]
        fn wellformed_emails_pass(email in "[a-z]{3,10}@[a-z]{3,8}\\.(com|org|net)") {
            prop_assert!(validate_email(&email).is_ok());
        }
    }
}

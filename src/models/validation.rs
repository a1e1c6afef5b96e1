//! Field constraints for transfer schemas
//!
//! Every Create/Update schema validates itself through these helpers before
//! anything reaches the storage layer. A violation is reported as a typed
//! [`ValidationError`] naming the offending field; values are never trimmed,
//! truncated or otherwise coerced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex")
});

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color regex"));

static MIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*/[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*$")
        .expect("valid mime regex")
});

/// A single field constraint violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// Human-readable description of the violated constraint
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Require a non-empty value no longer than `max` characters.
pub fn required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    max_len(field, value, max)
}

/// Require a value no longer than `max` characters (counted as Unicode scalars).
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }
    Ok(())
}

/// Require a length within `min..=max` characters.
pub fn len_between(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    max_len(field, value, max)
}

/// Apply [`max_len`] to an optional value.
pub fn optional_max_len(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

pub fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    max_len(field, value, 255)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::new(field, "is not a valid email address"));
    }
    Ok(())
}

/// Slugs are URL-safe: lowercase ASCII letters, digits and single hyphens.
pub fn slug(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    required(field, value, max)?;
    let well_formed = value
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if !well_formed {
        return Err(ValidationError::new(
            field,
            "may only contain lowercase letters, digits and single hyphens",
        ));
    }
    Ok(())
}

pub fn hex_color(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR_RE.is_match(value) {
        return Err(ValidationError::new(field, "must be a hex color like #1a2b3c"));
    }
    Ok(())
}

pub fn mime_type(field: &'static str, value: &str) -> Result<(), ValidationError> {
    required(field, value, 100)?;
    if !MIME_RE.is_match(value) {
        return Err(ValidationError::new(field, "must look like type/subtype"));
    }
    Ok(())
}

pub fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

/// Every id in a relation list must be a positive integer.
pub fn ids(field: &'static str, values: &[i64]) -> Result<(), ValidationError> {
    if values.iter().any(|id| *id <= 0) {
        return Err(ValidationError::new(field, "ids must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required("title", "", 10).is_err());
        assert!(required("title", "   ", 10).is_err());
        assert!(required("title", "ok", 10).is_ok());
    }

    #[test]
    fn test_max_len_counts_chars_not_bytes() {
        // 4 chars, 12 bytes
        assert!(max_len("name", "技术分类", 4).is_ok());
        assert!(max_len("name", "技术分类x", 4).is_err());
    }

    #[test]
    fn test_len_between() {
        assert!(len_between("password", "short", 8, 255).is_err());
        assert!(len_between("password", "long-enough", 8, 255).is_ok());
    }

    #[test]
    fn test_email_pattern() {
        assert!(email("email", "jane.doe+cms@example.co.uk").is_ok());
        assert!(email("email", "no-at-sign.example.com").is_err());
        assert!(email("email", "user@nodot").is_err());
        assert!(email("email", "spaces in@example.com").is_err());
    }

    #[test]
    fn test_email_error_names_field() {
        let err = email("author_email", "broken").unwrap_err();
        assert_eq!(err.field, "author_email");
        assert_eq!(err.to_string(), "author_email: is not a valid email address");
    }

    #[test]
    fn test_slug_rules() {
        assert!(slug("slug", "hello-world-2", 200).is_ok());
        assert!(slug("slug", "Hello", 200).is_err());
        assert!(slug("slug", "double--hyphen", 200).is_err());
        assert!(slug("slug", "-leading", 200).is_err());
        assert!(slug("slug", "trailing-", 200).is_err());
        assert!(slug("slug", "with space", 200).is_err());
    }

    #[test]
    fn test_hex_color() {
        assert!(hex_color("color", "#fff").is_ok());
        assert!(hex_color("color", "#1A2b3C").is_ok());
        assert!(hex_color("color", "red").is_err());
        assert!(hex_color("color", "#12345").is_err());
    }

    #[test]
    fn test_mime_type() {
        assert!(mime_type("mime_type", "image/png").is_ok());
        assert!(mime_type("mime_type", "application/vnd.ms-excel").is_ok());
        assert!(mime_type("mime_type", "image").is_err());
        assert!(mime_type("mime_type", "").is_err());
    }

    #[test]
    fn test_ids_must_be_positive() {
        assert!(ids("tag_ids", &[1, 2, 3]).is_ok());
        assert!(ids("tag_ids", &[1, 0]).is_err());
        assert!(ids("tag_ids", &[-4]).is_err());
    }

    proptest! {
        #[test]
        fn prop_generated_slugs_validate(parts in prop::collection::vec("[a-z0-9]{1,8}", 1..5)) {
            let value = parts.join("-");
            prop_assume!(value.len() <= 200);
            prop_assert!(slug("slug", &value, 200).is_ok());
        }

        #[test]
        fn prop_uppercase_never_valid_slug(value in "[a-z]{0,5}[A-Z][a-z]{0,5}") {
            prop_assert!(slug("slug", &value, 200).is_err());
        }

        #[test]
        fn prop_max_len_boundary(len in 0usize..64) {
            let value = "a".repeat(len);
            prop_assert_eq!(max_len("f", &value, 32).is_ok(), len <= 32);
        }
    }
}

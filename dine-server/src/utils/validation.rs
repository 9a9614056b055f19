//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Helpers return the message only; callers wrap it into their own
//! validation error variant.

// ── Text length limits ──────────────────────────────────────────────

/// Customer and cashier names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, special requests, refund reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Phone numbers, external provider ids
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Maximum quantity on a single line
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum lines on a single order
pub const MAX_ITEMS_PER_ORDER: usize = 200;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.len() > max_len {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), String> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ));
    }
    Ok(())
}

/// `Some` only when the value has non-whitespace content
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Ana", "customer_name", MAX_NAME_LEN).is_ok());
        assert_eq!(
            validate_required_text("  ", "customer_name", MAX_NAME_LEN),
            Err("customer_name must not be empty".to_string())
        );
        assert!(validate_required_text(&"x".repeat(101), "phone", MAX_SHORT_TEXT_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("ok".into()), "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(501)), "notes", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some(" 0812 ".into())), Some("0812"));
        assert_eq!(non_blank(&Some("   ".into())), None);
        assert_eq!(non_blank(&None), None);
    }
}

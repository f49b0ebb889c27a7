//! Input validation helpers
//!
//! Text length limits and numeric bounds shared by handlers and the order
//! service. SQLite TEXT has no built-in length enforcement.

use crate::utils::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Menu item names, categories, customer names
pub const MAX_NAME_LEN: usize = 200;

/// Table identifiers from the QR code URL
pub const MAX_TABLE_ID_LEN: usize = 32;

/// Per-line kitchen notes
pub const MAX_NOTE_LEN: usize = 500;

/// Image URLs
pub const MAX_URL_LEN: usize = 2048;

// ── Numeric bounds ──────────────────────────────────────────────────

/// Upper bound for one order line's quantity
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Upper bound for a single price, keeps totals far from i64 overflow
pub const MAX_PRICE: i64 = 1_000_000_000;

/// Upper bound for lines in one order
pub const MAX_ORDER_LINES: usize = 200;

// ── Helpers ─────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Prices are whole amounts in `0..=MAX_PRICE`
pub fn validate_price(price: i64) -> Result<(), AppError> {
    if !(0..=MAX_PRICE).contains(&price) {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("Price must be between 0 and {MAX_PRICE}, got {price}"),
        ));
    }
    Ok(())
}

pub fn validate_quantity(quantity: u32) -> Result<(), AppError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Budi", "customer_name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("  ", "customer_name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert!(validate_required_text(&"x".repeat(MAX_NAME_LEN + 1), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(0).is_ok());
        assert_eq!(validate_price(-1).unwrap_err().code, ErrorCode::MenuItemInvalidPrice);
        assert!(validate_price(MAX_PRICE + 1).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }
}

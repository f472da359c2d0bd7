//! Validation helpers and limits shared by the messaging entities

use rust_decimal::Decimal;
use unimarket_common::{Error, Result};

/// Maximum length of user identifiers
pub const MAX_ID_LENGTH: usize = 200;

/// Maximum display name length
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum book title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum message body length
pub const MAX_BODY_LENGTH: usize = 5000;

/// Maximum message kind tag length
pub const MAX_KIND_LENGTH: usize = 50;

/// Maximum conversation id length; large enough for any derived
/// `{buyer}_{seller}_{title}` purchase id
pub const MAX_CONVERSATION_ID_LENGTH: usize = 2 * MAX_ID_LENGTH + MAX_TITLE_LENGTH + 2;

/// Require a non-blank user identifier within the length limit
pub fn require_id(field: &str, value: &str) -> Result<()> {
    require_identifier(field, value, MAX_ID_LENGTH)
}

/// Require a non-blank conversation id within the length limit
pub fn require_conversation_id(value: &str) -> Result<()> {
    require_identifier("conversation_id", value, MAX_CONVERSATION_ID_LENGTH)
}

fn require_identifier(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    check_length(field, value, max)
}

/// Require non-blank text within the length limit
pub fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!(
            "{} cannot be empty or whitespace-only",
            field
        )));
    }
    check_length(field, value, max)
}

/// Check optional text against a length limit
pub fn check_optional_text(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) => check_length(field, v, max),
        None => Ok(()),
    }
}

/// Prices are snapshots of a listing and never negative
pub fn check_price(price: Option<Decimal>) -> Result<()> {
    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => Err(Error::Validation(
            "Book price cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

//! Input validation for request data.
//!
//! Each check returns `Ok(())` or a human-readable message; callers collect the
//! messages per field with [`ValidationErrorBuilder`](super::error::ValidationErrorBuilder).

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    /// Loose email shape: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// SKU codes: letters, digits, dashes, underscores and dots
    static ref SKU_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// Maximum length for names, categories and other short text fields
const MAX_TEXT_LENGTH: usize = 200;

/// Trim an optional field, mapping blank values to `None`
pub fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a required short text field
pub fn validate_required_text(value: Option<&str>, label: &str) -> Result<(), String> {
    match normalize(value) {
        None => Err(format!("{} is required", label)),
        Some(v) if v.chars().count() > MAX_TEXT_LENGTH => Err(format!(
            "{} is too long (max {} characters)",
            label, MAX_TEXT_LENGTH
        )),
        Some(_) => Ok(()),
    }
}

/// Validate an email address
pub fn validate_email(email: Option<&str>) -> Result<(), String> {
    match normalize(email) {
        None => Err("Email is required".to_string()),
        Some(e) if e.len() > 254 => Err("Email is too long (max 254 characters)".to_string()),
        Some(e) if !EMAIL_REGEX.is_match(&e) => Err("Invalid email address".to_string()),
        Some(_) => Ok(()),
    }
}

/// Validate a password (presence only; strength rules are not enforced)
pub fn validate_password(password: Option<&str>) -> Result<(), String> {
    match password {
        Some(p) if !p.is_empty() => Ok(()),
        _ => Err("Password is required".to_string()),
    }
}

/// Validate a product SKU
pub fn validate_sku(sku: Option<&str>) -> Result<(), String> {
    match normalize(sku) {
        None => Err("SKU is required".to_string()),
        Some(s) if s.len() > 64 => Err("SKU is too long (max 64 characters)".to_string()),
        Some(s) if !SKU_REGEX.is_match(&s) => {
            Err("SKU may only contain letters, digits, '.', '_' and '-'".to_string())
        }
        Some(_) => Ok(()),
    }
}

/// Validate a monetary amount that must not be negative
pub fn validate_amount(amount: Option<Decimal>, label: &str) -> Result<(), String> {
    match amount {
        None => Err(format!("{} is required", label)),
        Some(a) if a < Decimal::ZERO => Err(format!("{} must not be negative", label)),
        Some(_) => Ok(()),
    }
}

/// Validate a stock level
pub fn validate_stock(stock: Option<i64>) -> Result<(), String> {
    match stock {
        None => Err("Stock is required".to_string()),
        Some(s) if s < 0 => Err("Stock must not be negative".to_string()),
        Some(_) => Ok(()),
    }
}

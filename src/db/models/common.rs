//! Common types and utilities shared across models.

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};
use std::str::FromStr;

/// Base URL of the initials avatar service
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/initials/svg?seed=";

/// Current time as an RFC 3339 UTC timestamp with fixed microsecond precision.
///
/// Fixed width keeps lexicographic order equal to chronological order, which
/// the `ORDER BY date DESC` queries rely on.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Deterministic avatar URL derived from a display name
pub fn avatar_url(name: &str) -> String {
    let seed: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '+' } else { c })
        .collect();
    format!("{}{}", AVATAR_BASE_URL, seed)
}

/// Read a decimal stored as TEXT
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url_replaces_whitespace() {
        assert_eq!(
            avatar_url("Alice Smith"),
            "https://api.dicebear.com/7.x/initials/svg?seed=Alice+Smith"
        );
        assert_eq!(
            avatar_url("a\tb  c"),
            "https://api.dicebear.com/7.x/initials/svg?seed=a+b++c"
        );
    }

    #[test]
    fn test_avatar_url_is_deterministic() {
        assert_eq!(avatar_url("Bob"), avatar_url("Bob"));
    }

    #[test]
    fn test_now_timestamp_has_fixed_width() {
        let ts = now_timestamp();
        // 2026-01-01T00:00:00.000000Z
        assert_eq!(ts.len(), 27);
        assert!(ts.ends_with('Z'));
    }
}

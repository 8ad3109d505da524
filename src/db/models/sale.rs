//! Sale models and queries.
//!
//! Sales are immutable once written. Line items are stored as a JSON document
//! next to the sale row, with product name and unit price snapshotted at the
//! time of the sale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use super::common::decimal_column;

/// Prefix of the human-readable sale code
pub const DISPLAY_ID_PREFIX: &str = "SALE-";

/// One product line of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    #[serde(rename = "price", alias = "unitPrice", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl LineItem {
    /// `unit_price * quantity`, or `None` if it does not fit in a `Decimal`
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of all line subtotals, or `None` on overflow
pub fn order_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.subtotal()?))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Internal record id
    pub record_id: String,
    /// Display id, e.g. `SALE-001`
    pub id: String,
    pub customer_id: String,
    /// Customer name at the time of the sale
    pub customer_name: String,
    pub line_items: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date: String,
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Sale {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let line_items: String = row.try_get("line_items")?;
        let line_items = serde_json::from_str(&line_items).map_err(|e| sqlx::Error::ColumnDecode {
            index: "line_items".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            record_id: row.try_get("id")?,
            id: row.try_get("display_id")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            line_items,
            total: decimal_column(row, "total")?,
            date: row.try_get("date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    #[serde(default, alias = "products")]
    pub line_items: Vec<LineItem>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
}

/// Format the display id for the `sequence`-th sale (1-based), zero-padded to three digits
pub fn format_display_id(sequence: i64) -> String {
    format!("{}{:03}", DISPLAY_ID_PREFIX, sequence)
}

pub async fn count_sales(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
        .fetch_one(db)
        .await
}

pub async fn insert_sale(db: &SqlitePool, sale: &Sale) -> Result<(), sqlx::Error> {
    let line_items = serde_json::to_string(&sale.line_items)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO sales (id, display_id, customer_id, customer_name, line_items, total, date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.record_id)
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(&sale.customer_name)
    .bind(&line_items)
    .bind(sale.total.to_string())
    .bind(&sale.date)
    .bind(&sale.created_at)
    .execute(db)
    .await?;

    Ok(())
}

/// All sales, newest first
pub async fn list_sales(db: &SqlitePool) -> Result<Vec<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY date DESC, rowid DESC")
        .fetch_all(db)
        .await
}

/// Sales referencing a customer id, newest first
pub async fn list_sales_for_customer(
    db: &SqlitePool,
    customer_id: &str,
) -> Result<Vec<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>(
        "SELECT * FROM sales WHERE customer_id = ? ORDER BY date DESC, rowid DESC",
    )
    .bind(customer_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_display_id() {
        assert_eq!(format_display_id(1), "SALE-001");
        assert_eq!(format_display_id(42), "SALE-042");
        assert_eq!(format_display_id(999), "SALE-999");
        assert_eq!(format_display_id(1000), "SALE-1000");
    }

    #[test]
    fn test_line_item_accepts_price_aliases() {
        let a: LineItem = serde_json::from_str(
            r#"{"productId":"p1","productName":"Mouse","quantity":2,"price":25.99}"#,
        )
        .unwrap();
        let b: LineItem = serde_json::from_str(
            r#"{"productId":"p1","productName":"Mouse","quantity":2,"unitPrice":25.99}"#,
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.subtotal(), Some(Decimal::new(5198, 2)));
    }

    #[test]
    fn test_order_total_overflow_is_none() {
        let line = |quantity: i64, unit_price: Decimal| LineItem {
            product_id: "p1".to_string(),
            product_name: "Mouse".to_string(),
            quantity,
            unit_price,
        };

        let items = vec![line(2, Decimal::new(2599, 2)), line(1, Decimal::new(1, 2))];
        assert_eq!(order_total(&items), Some(Decimal::new(5199, 2)));
        assert_eq!(order_total(&[]), Some(Decimal::ZERO));

        let huge = line(1_000_000_000_000_000_000, Decimal::new(100_000_000_000, 0));
        assert_eq!(huge.subtotal(), None);
        assert_eq!(order_total(&[huge]), None);

        let max = line(1, Decimal::MAX);
        assert_eq!(order_total(&[max.clone(), max]), None);
    }

    #[test]
    fn test_create_request_accepts_products_alias() {
        let req: CreateSaleRequest = serde_json::from_str(
            r#"{"customerId":"c1","products":[{"productId":"p1","productName":"Mouse","quantity":1,"price":1}]}"#,
        )
        .unwrap();
        assert_eq!(req.line_items.len(), 1);
        assert!(req.total.is_none());
    }

    #[test]
    fn test_sale_serializes_display_id_as_id() {
        let sale = Sale {
            record_id: "rec".to_string(),
            id: "SALE-001".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Bob".to_string(),
            line_items: vec![],
            total: Decimal::new(5198, 2),
            date: "2026-01-01T00:00:00.000000Z".to_string(),
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
        };

        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["id"], "SALE-001");
        assert_eq!(json["recordId"], "rec");
        assert_eq!(json["total"], serde_json::json!(51.98));
    }
}

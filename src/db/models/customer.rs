//! Customer ledger models and queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use super::common::decimal_column;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Running sum of sale totals, maintained incrementally
    #[serde(with = "rust_decimal::serde::float")]
    pub total_purchases: Decimal,
    pub last_purchase_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Customer {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            total_purchases: decimal_column(row, "total_purchases")?,
            last_purchase_date: row.try_get("last_purchase_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn list_customers(db: &SqlitePool) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

pub async fn find_customer_by_id(db: &SqlitePool, id: &str) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_customer_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn insert_customer(db: &SqlitePool, customer: &Customer) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO customers (id, name, email, phone, total_purchases, last_purchase_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(customer.total_purchases.to_string())
    .bind(&customer.last_purchase_date)
    .bind(&customer.created_at)
    .bind(&customer.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Persist contact details (name, email, phone)
pub async fn update_customer_details(db: &SqlitePool, customer: &Customer) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE customers SET
            name = ?,
            email = ?,
            phone = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.updated_at)
    .bind(&customer.id)
    .execute(db)
    .await?;

    Ok(())
}

/// Persist ledger fields (total purchases, last purchase date)
pub async fn update_customer_ledger(db: &SqlitePool, customer: &Customer) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE customers SET
            total_purchases = ?,
            last_purchase_date = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(customer.total_purchases.to_string())
    .bind(&customer.last_purchase_date)
    .bind(&customer.updated_at)
    .bind(&customer.id)
    .execute(db)
    .await?;

    Ok(())
}

/// Returns the number of rows removed. Sales referencing the customer are left in place.
pub async fn delete_customer(db: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, now_timestamp};

    fn sample_customer(email: &str) -> Customer {
        let now = now_timestamp();
        Customer {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Bob".to_string(),
            email: email.to_string(),
            phone: "555".to_string(),
            total_purchases: Decimal::ZERO,
            last_purchase_date: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_decimal_total_survives_storage() {
        let pool = init_in_memory().await.unwrap();
        let mut customer = sample_customer("bob@x.com");
        insert_customer(&pool, &customer).await.unwrap();

        customer.total_purchases = Decimal::new(5198, 2);
        customer.last_purchase_date = Some(now_timestamp());
        update_customer_ledger(&pool, &customer).await.unwrap();

        let found = find_customer_by_id(&pool, &customer.id).await.unwrap().unwrap();
        assert_eq!(found.total_purchases, Decimal::new(5198, 2));
        assert!(found.last_purchase_date.is_some());
    }

    #[tokio::test]
    async fn test_serializes_total_as_number() {
        let mut customer = sample_customer("bob@x.com");
        customer.total_purchases = Decimal::new(5198, 2);

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["totalPurchases"], serde_json::json!(51.98));
        assert!(json["lastPurchaseDate"].is_null());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let pool = init_in_memory().await.unwrap();
        let customer = sample_customer("gone@x.com");
        insert_customer(&pool, &customer).await.unwrap();

        assert_eq!(delete_customer(&pool, &customer.id).await.unwrap(), 1);
        assert_eq!(delete_customer(&pool, &customer.id).await.unwrap(), 0);
        assert!(find_customer_by_email(&pool, "gone@x.com").await.unwrap().is_none());
    }
}

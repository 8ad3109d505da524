//! Catalog product models and queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use super::common::decimal_column;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i64,
    pub sku: String,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price: decimal_column(row, "price")?,
            stock: row.try_get("stock")?,
            sku: row.try_get("sku")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
}

pub async fn list_products(db: &SqlitePool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

pub async fn find_product_by_id(db: &SqlitePool, id: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_product_by_sku(db: &SqlitePool, sku: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?")
        .bind(sku)
        .fetch_optional(db)
        .await
}

pub async fn insert_product(db: &SqlitePool, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, category, price, stock, sku, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price.to_string())
    .bind(product.stock)
    .bind(&product.sku)
    .bind(&product.created_at)
    .bind(&product.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn update_product(db: &SqlitePool, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE products SET
            name = ?,
            category = ?,
            price = ?,
            stock = ?,
            sku = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price.to_string())
    .bind(product.stock)
    .bind(&product.sku)
    .bind(&product.updated_at)
    .bind(&product.id)
    .execute(db)
    .await?;

    Ok(())
}

/// Returns the number of rows removed
pub async fn delete_product(db: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

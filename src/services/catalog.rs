//! Catalog store: product CRUD with SKU uniqueness.

use tracing::info;
use uuid::Uuid;

use crate::db::{self, now_timestamp, CreateProductRequest, Product, UpdateProductRequest};
use crate::DbPool;

use super::error::{is_unique_violation, ServiceError, ValidationErrorBuilder};
use super::validation::{
    normalize, validate_amount, validate_required_text, validate_sku, validate_stock,
};

fn duplicate_sku() -> ServiceError {
    ServiceError::DuplicateKey {
        entity: "product",
        field: "sku",
    }
}

fn map_write_error(err: sqlx::Error) -> ServiceError {
    if is_unique_violation(&err) {
        duplicate_sku()
    } else {
        ServiceError::Database(err)
    }
}

pub struct Catalog<'a> {
    db: &'a DbPool,
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a DbPool) -> Self {
        Self { db }
    }

    /// All products, newest first
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(db::list_products(self.db).await?)
    }

    pub async fn create(&self, req: CreateProductRequest) -> Result<Product, ServiceError> {
        let name = normalize(req.name.as_deref());
        let category = normalize(req.category.as_deref());
        let sku = normalize(req.sku.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_required_text(name.as_deref(), "Name"));
        errors.check("category", validate_required_text(category.as_deref(), "Category"));
        errors.check("price", validate_amount(req.price, "Price"));
        errors.check("stock", validate_stock(req.stock));
        errors.check("sku", validate_sku(sku.as_deref()));
        errors.finish()?;

        let (Some(name), Some(category), Some(price), Some(stock), Some(sku)) =
            (name, category, req.price, req.stock, sku)
        else {
            return Err(ServiceError::validation_field(
                "request",
                "Please provide name, category, price, stock and sku",
            ));
        };

        if db::find_product_by_sku(self.db, &sku).await?.is_some() {
            return Err(duplicate_sku());
        }

        let now = now_timestamp();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name,
            category,
            price,
            stock,
            sku,
            created_at: now.clone(),
            updated_at: now,
        };

        db::insert_product(self.db, &product)
            .await
            .map_err(map_write_error)?;

        info!(product_id = %product.id, sku = %product.sku, "Created product");
        Ok(product)
    }

    /// Partial update; omitted fields keep their current value
    pub async fn update(&self, id: &str, req: UpdateProductRequest) -> Result<Product, ServiceError> {
        let mut product = db::find_product_by_id(self.db, id)
            .await?
            .ok_or(ServiceError::NotFound("Product"))?;

        let name = normalize(req.name.as_deref());
        let category = normalize(req.category.as_deref());
        let sku = normalize(req.sku.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        if name.is_some() {
            errors.check("name", validate_required_text(name.as_deref(), "Name"));
        }
        if category.is_some() {
            errors.check("category", validate_required_text(category.as_deref(), "Category"));
        }
        if req.price.is_some() {
            errors.check("price", validate_amount(req.price, "Price"));
        }
        if req.stock.is_some() {
            errors.check("stock", validate_stock(req.stock));
        }
        if sku.is_some() {
            errors.check("sku", validate_sku(sku.as_deref()));
        }
        errors.finish()?;

        if let Some(sku) = sku {
            if sku != product.sku {
                if db::find_product_by_sku(self.db, &sku).await?.is_some() {
                    return Err(duplicate_sku());
                }
                product.sku = sku;
            }
        }
        if let Some(name) = name {
            product.name = name;
        }
        if let Some(category) = category {
            product.category = category;
        }
        if let Some(price) = req.price {
            product.price = price;
        }
        if let Some(stock) = req.stock {
            product.stock = stock;
        }
        product.updated_at = now_timestamp();

        db::update_product(self.db, &product)
            .await
            .map_err(map_write_error)?;

        Ok(product)
    }

    pub async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        if db::delete_product(self.db, id).await? == 0 {
            return Err(ServiceError::NotFound("Product"));
        }

        info!(product_id = %id, "Removed product");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;
    use rust_decimal::Decimal;

    fn mouse() -> CreateProductRequest {
        CreateProductRequest {
            name: Some("Mouse".to_string()),
            category: Some("Electronics".to_string()),
            price: Some(Decimal::new(2599, 2)),
            stock: Some(150),
            sku: Some("WM-001".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);

        let product = catalog.create(mouse()).await.unwrap();
        assert_eq!(product.price, Decimal::new(2599, 2));

        let products = catalog.list().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, product.id);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_sku() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);

        catalog.create(mouse()).await.unwrap();
        let err = catalog.create(mouse()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateKey {
                entity: "product",
                field: "sku"
            }
        ));
        assert_eq!(catalog.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);

        let mut req = mouse();
        req.price = Some(Decimal::new(-1, 0));
        req.stock = Some(-3);
        req.category = None;

        match catalog.create(req).await.unwrap_err() {
            ServiceError::Validation { fields, .. } => {
                assert!(fields.contains_key("price"));
                assert!(fields.contains_key("stock"));
                assert!(fields.contains_key("category"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);
        let product = catalog.create(mouse()).await.unwrap();

        let updated = catalog
            .update(
                &product.id,
                UpdateProductRequest {
                    stock: Some(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 80);
        assert_eq!(updated.name, "Mouse");
        assert_eq!(updated.sku, "WM-001");
        assert_eq!(updated.price, Decimal::new(2599, 2));
    }

    #[tokio::test]
    async fn test_update_rechecks_sku() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);
        catalog.create(mouse()).await.unwrap();

        let mut keyboard = mouse();
        keyboard.name = Some("Keyboard".to_string());
        keyboard.sku = Some("KB-001".to_string());
        let keyboard = catalog.create(keyboard).await.unwrap();

        let err = catalog
            .update(
                &keyboard.id,
                UpdateProductRequest {
                    sku: Some("WM-001".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { .. }));

        // Keeping the same sku is not a collision
        let same = catalog
            .update(
                &keyboard.id,
                UpdateProductRequest {
                    sku: Some("KB-001".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_remove_unknown_product() {
        let pool = init_in_memory().await.unwrap();
        let catalog = Catalog::new(&pool);

        assert!(matches!(
            catalog
                .update("missing", UpdateProductRequest::default())
                .await
                .unwrap_err(),
            ServiceError::NotFound("Product")
        ));
        assert!(matches!(
            catalog.remove("missing").await.unwrap_err(),
            ServiceError::NotFound("Product")
        ));
    }
}

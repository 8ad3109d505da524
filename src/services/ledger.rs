//! Customer ledger: customer CRUD.
//!
//! Purchase totals are only written by the sale recorder; the contact-detail
//! operations here never touch them.

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, now_timestamp, CreateCustomerRequest, Customer, UpdateCustomerRequest};
use crate::DbPool;

use super::error::{is_unique_violation, ServiceError, ValidationErrorBuilder};
use super::validation::{normalize, validate_email, validate_required_text};

fn duplicate_email() -> ServiceError {
    ServiceError::DuplicateKey {
        entity: "customer",
        field: "email",
    }
}

fn map_write_error(err: sqlx::Error) -> ServiceError {
    if is_unique_violation(&err) {
        duplicate_email()
    } else {
        ServiceError::Database(err)
    }
}

pub struct CustomerLedger<'a> {
    db: &'a DbPool,
}

impl<'a> CustomerLedger<'a> {
    pub fn new(db: &'a DbPool) -> Self {
        Self { db }
    }

    /// All customers, newest first
    pub async fn list(&self) -> Result<Vec<Customer>, ServiceError> {
        Ok(db::list_customers(self.db).await?)
    }

    /// Create a customer with an empty purchase history
    pub async fn create(&self, req: CreateCustomerRequest) -> Result<Customer, ServiceError> {
        let name = normalize(req.name.as_deref());
        let email = normalize(req.email.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_required_text(name.as_deref(), "Name"));
        errors.check("email", validate_email(email.as_deref()));
        errors.finish()?;

        let (Some(name), Some(email)) = (name, email) else {
            return Err(ServiceError::validation_field(
                "request",
                "Please provide name and email",
            ));
        };

        if db::find_customer_by_email(self.db, &email).await?.is_some() {
            return Err(duplicate_email());
        }

        let now = now_timestamp();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone: normalize(req.phone.as_deref()).unwrap_or_default(),
            total_purchases: Decimal::ZERO,
            last_purchase_date: None,
            created_at: now.clone(),
            updated_at: now,
        };

        db::insert_customer(self.db, &customer)
            .await
            .map_err(map_write_error)?;

        info!(customer_id = %customer.id, "Created customer {}", customer.email);
        Ok(customer)
    }

    /// Update contact details; omitted fields keep their current value
    pub async fn update(
        &self,
        id: &str,
        req: UpdateCustomerRequest,
    ) -> Result<Customer, ServiceError> {
        let mut customer = db::find_customer_by_id(self.db, id)
            .await?
            .ok_or(ServiceError::NotFound("Customer"))?;

        let name = normalize(req.name.as_deref());
        let email = normalize(req.email.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        if name.is_some() {
            errors.check("name", validate_required_text(name.as_deref(), "Name"));
        }
        if email.is_some() {
            errors.check("email", validate_email(email.as_deref()));
        }
        errors.finish()?;

        if let Some(email) = email {
            if email != customer.email {
                if db::find_customer_by_email(self.db, &email).await?.is_some() {
                    return Err(duplicate_email());
                }
                customer.email = email;
            }
        }
        if let Some(name) = name {
            customer.name = name;
        }
        if let Some(phone) = req.phone {
            customer.phone = phone.trim().to_string();
        }
        customer.updated_at = now_timestamp();

        db::update_customer_details(self.db, &customer)
            .await
            .map_err(map_write_error)?;

        Ok(customer)
    }

    /// Hard delete. Sales referencing the customer are kept.
    pub async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        if db::delete_customer(self.db, id).await? == 0 {
            return Err(ServiceError::NotFound("Customer"));
        }

        info!(customer_id = %id, "Removed customer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    fn bob() -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: Some("Bob".to_string()),
            email: Some("bob@x.com".to_string()),
            phone: Some("555".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_starts_with_empty_history() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        let customer = ledger.create(bob()).await.unwrap();
        assert_eq!(customer.total_purchases, Decimal::ZERO);
        assert!(customer.last_purchase_date.is_none());
        assert_eq!(customer.phone, "555");
    }

    #[tokio::test]
    async fn test_create_without_phone() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        let mut req = bob();
        req.phone = None;
        assert_eq!(ledger.create(req).await.unwrap().phone, "");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        ledger.create(bob()).await.unwrap();
        assert!(matches!(
            ledger.create(bob()).await.unwrap_err(),
            ServiceError::DuplicateKey {
                entity: "customer",
                field: "email"
            }
        ));
    }

    #[tokio::test]
    async fn test_create_requires_name_and_email() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        match ledger.create(CreateCustomerRequest::default()).await.unwrap_err() {
            ServiceError::Validation { fields, .. } => {
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_ledger_fields() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        let mut customer = ledger.create(bob()).await.unwrap();
        customer.total_purchases = Decimal::new(5198, 2);
        customer.last_purchase_date = Some(now_timestamp());
        db::update_customer_ledger(&pool, &customer).await.unwrap();

        let updated = ledger
            .update(
                &customer.id,
                UpdateCustomerRequest {
                    name: Some("Robert".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Robert");
        assert_eq!(updated.email, "bob@x.com");
        assert_eq!(updated.total_purchases, Decimal::new(5198, 2));
        assert!(updated.last_purchase_date.is_some());
    }

    #[tokio::test]
    async fn test_update_rechecks_email() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        ledger.create(bob()).await.unwrap();
        let carol = ledger
            .create(CreateCustomerRequest {
                name: Some("Carol".to_string()),
                email: Some("carol@x.com".to_string()),
                phone: None,
            })
            .await
            .unwrap();

        let err = ledger
            .update(
                &carol.id,
                UpdateCustomerRequest {
                    email: Some("bob@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_remove_unknown_customer() {
        let pool = init_in_memory().await.unwrap();
        let ledger = CustomerLedger::new(&pool);

        let customer = ledger.create(bob()).await.unwrap();
        ledger.remove(&customer.id).await.unwrap();
        assert!(matches!(
            ledger.remove(&customer.id).await.unwrap_err(),
            ServiceError::NotFound("Customer")
        ));
        assert!(ledger.list().await.unwrap().is_empty());
    }
}

//! Sale recorder.
//!
//! Recording a sale is two independent writes: the sale row, then the
//! customer's running total. The second write is best effort. When it fails or
//! the customer no longer exists, the sale stays recorded and the ledger is
//! left behind; nothing retries or compensates. A total that would overflow
//! `Decimal` also leaves the ledger untouched.
//!
//! The ledger step reads the customer, adds in memory and writes the new total
//! back. Two concurrent sales for the same customer can therefore lose one
//! increment.
//!
//! Display ids (`SALE-001`, ...) come from `count(sales) + 1` read right before
//! the insert. Two concurrent recorders can read the same count and both
//! persist the same display id. Each sale also has a unique internal record id.

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::metrics::{record_ledger_update, record_sale};
use crate::db::{
    self, format_display_id, now_timestamp, CreateSaleRequest, Customer, LineItem, Sale, User,
};
use crate::DbPool;

use super::error::{ServiceError, ValidationErrorBuilder};
use super::validation::{normalize, validate_amount};

/// What happened to the customer's running total after a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Applied,
    /// No customer with the sale's customer id
    Skipped,
    Failed,
}

impl LedgerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOutcome::Applied => "applied",
            LedgerOutcome::Skipped => "skipped",
            LedgerOutcome::Failed => "failed",
        }
    }
}

pub struct SaleRecorder<'a> {
    db: &'a DbPool,
}

impl<'a> SaleRecorder<'a> {
    pub fn new(db: &'a DbPool) -> Self {
        Self { db }
    }

    /// Display id the next recorded sale would get
    pub async fn next_display_id(&self) -> Result<String, ServiceError> {
        let count = db::count_sales(self.db).await?;
        Ok(format_display_id(count + 1))
    }

    /// Record a sale and add its total to the customer's ledger entry
    pub async fn create_sale(&self, req: CreateSaleRequest) -> Result<Sale, ServiceError> {
        if req.line_items.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        let customer_id = normalize(req.customer_id.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        if customer_id.is_none() {
            errors.add("customerId", "Customer is required");
        }
        for (idx, item) in req.line_items.iter().enumerate() {
            validate_line_item(&mut errors, idx, item);
        }
        if req.total.is_some() {
            errors.check("total", validate_amount(req.total, "Total"));
        }
        errors.finish()?;

        let Some(customer_id) = customer_id else {
            return Err(ServiceError::validation_field(
                "customerId",
                "Customer is required",
            ));
        };

        let customer_name = match normalize(req.customer_name.as_deref()) {
            Some(name) => name,
            None => db::find_customer_by_id(self.db, &customer_id)
                .await?
                .map(|c| c.name)
                .ok_or_else(|| {
                    ServiceError::validation_field("customerName", "Customer name is required")
                })?,
        };

        let total = match req.total {
            Some(total) => total,
            None => db::order_total(&req.line_items).ok_or_else(|| {
                ServiceError::validation_field("lineItems", "Order total is too large")
            })?,
        };

        let display_id = self.next_display_id().await?;
        let now = now_timestamp();
        let sale = Sale {
            record_id: Uuid::new_v4().to_string(),
            id: display_id,
            customer_id,
            customer_name,
            line_items: req.line_items,
            total,
            date: now.clone(),
            created_at: now,
        };

        db::insert_sale(self.db, &sale).await?;
        record_sale();
        info!(
            sale = %sale.id,
            customer_id = %sale.customer_id,
            total = %sale.total,
            "Recorded sale"
        );

        let outcome = self.apply_to_ledger(&sale).await;
        record_ledger_update(outcome.as_str());

        Ok(sale)
    }

    /// Add the sale total to the customer's running total. Never fails the caller.
    async fn apply_to_ledger(&self, sale: &Sale) -> LedgerOutcome {
        let customer = match db::find_customer_by_id(self.db, &sale.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                warn!(
                    sale = %sale.id,
                    customer_id = %sale.customer_id,
                    "Customer not found, ledger not updated"
                );
                return LedgerOutcome::Skipped;
            }
            Err(e) => {
                error!(sale = %sale.id, "Failed to load customer for ledger update: {}", e);
                return LedgerOutcome::Failed;
            }
        };

        let Some(total_purchases) = customer.total_purchases.checked_add(sale.total) else {
            error!(
                sale = %sale.id,
                customer_id = %sale.customer_id,
                "Customer total overflowed, ledger not updated"
            );
            return LedgerOutcome::Failed;
        };

        let updated = Customer {
            total_purchases,
            last_purchase_date: Some(sale.date.clone()),
            updated_at: now_timestamp(),
            ..customer
        };

        match db::update_customer_ledger(self.db, &updated).await {
            Ok(()) => LedgerOutcome::Applied,
            Err(e) => {
                error!(
                    sale = %sale.id,
                    customer_id = %sale.customer_id,
                    "Failed to update customer ledger: {}",
                    e
                );
                LedgerOutcome::Failed
            }
        }
    }

    /// All sales, newest first
    pub async fn list_sales(&self) -> Result<Vec<Sale>, ServiceError> {
        Ok(db::list_sales(self.db).await?)
    }

    /// Sales of the customer whose email matches the user's.
    ///
    /// Empty when no such customer exists.
    pub async fn my_orders(&self, user: &User) -> Result<Vec<Sale>, ServiceError> {
        match db::find_customer_by_email(self.db, &user.email).await? {
            Some(customer) => Ok(db::list_sales_for_customer(self.db, &customer.id).await?),
            None => Ok(Vec::new()),
        }
    }
}

fn validate_line_item(errors: &mut ValidationErrorBuilder, idx: usize, item: &LineItem) {
    let field = format!("lineItems[{}]", idx);
    if item.product_id.trim().is_empty() {
        errors.add(field.clone(), "Product is required");
    }
    if item.product_name.trim().is_empty() {
        errors.add(field.clone(), "Product name is required");
    }
    if item.quantity <= 0 {
        errors.add(field.clone(), "Quantity must be at least 1");
    }
    if item.unit_price < Decimal::ZERO {
        errors.add(field, "Price must not be negative");
    }
}

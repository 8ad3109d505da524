//! Domain services sitting between the HTTP handlers and the database.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod sales;
pub mod validation;

pub use auth::{Authenticator, Session};
pub use catalog::Catalog;
pub use error::{ServiceError, ValidationErrorBuilder};
pub use ledger::CustomerLedger;
pub use sales::{LedgerOutcome, SaleRecorder};

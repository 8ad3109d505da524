//! Database models split into domain-specific modules.

pub mod common;
pub mod customer;
pub mod product;
pub mod sale;
pub mod user;

pub use common::*;
pub use customer::*;
pub use product::*;
pub use sale::*;
pub use user::*;

//! Errors produced by the domain services.

use std::collections::HashMap;
use thiserror::Error;

/// Message used for every failed login, whatever the cause
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed fields, keyed by field name
    #[error("{message}")]
    Validation {
        message: String,
        fields: HashMap<String, Vec<String>>,
    },

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("A {entity} with this {field} already exists")]
    DuplicateKey {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("No order items")]
    EmptyOrder,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    /// Validation error with field-level details
    pub fn validation(fields: HashMap<String, Vec<String>>) -> Self {
        let message = if fields.len() == 1 {
            fields
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", fields.len())
        };

        Self::Validation { message, fields }
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = HashMap::new();
        fields.insert(field.to_string(), vec![message.into()]);
        Self::validation(fields)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err)
    }
}

/// Whether an insert or update failed on a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the error of a `Result<(), String>` check under `field`
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(e) = result {
            self.add(field, e);
        }
        self
    }

    /// Return Ok(()) if no errors, or the collected validation error
    pub fn finish(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_single_field_uses_field_message() {
        let err = ServiceError::validation_field("name", "Name is required");
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_validation_builder_collects_fields() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("name", "Name is required");
        builder.check("email", Err("Email is required".to_string()));
        builder.check("phone", Ok(()));
        builder.add("name", "Name is too short");

        match builder.finish() {
            Err(ServiceError::Validation { message, fields }) => {
                assert!(message.contains("2 fields"));
                assert_eq!(fields["name"].len(), 2);
                assert!(!fields.contains_key("phone"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_builder_finishes_ok() {
        assert!(ValidationErrorBuilder::new().finish().is_ok());
    }

    #[test]
    fn test_duplicate_key_message() {
        let err = ServiceError::DuplicateKey {
            entity: "product",
            field: "sku",
        };
        assert_eq!(err.to_string(), "A product with this sku already exists");
    }
}

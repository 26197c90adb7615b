//! User aggregate
//!
//! Identity of the legal owner of accounts. Accounts reference users by ID
//! only; this core never mutates users, it consults them to validate
//! ownership before opening an account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Bank customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    name: String,
    email: String,
    /// Government tax identifier (DNI, SSN, CPF). Unique in storage.
    tax_id: String,
}

impl User {
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        tax_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let email = email.into();
        let tax_id = tax_id.into();

        if name.trim().is_empty() {
            return Err(DomainError::InvalidArgument("name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(DomainError::InvalidArgument(format!(
                "invalid email format: {email}"
            )));
        }
        if tax_id.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "tax id is required".to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            email,
            tax_id,
        })
    }

    /// Rehydrate a user from its persisted form. Stored rows were validated
    /// on the way in.
    pub fn from_stored(id: Uuid, name: String, email: String, tax_id: String) -> Self {
        Self {
            id,
            name,
            email,
            tax_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user() {
        let user = User::new(Uuid::new_v4(), "Ada Lovelace", "ada@example.com", "12345678A");
        assert!(user.is_ok());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let result = User::new(Uuid::new_v4(), "Ada", "not-an-email", "12345678A");
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(User::new(Uuid::new_v4(), " ", "a@b.c", "tax").is_err());
        assert!(User::new(Uuid::new_v4(), "Ada", "a@b.c", "").is_err());
    }
}

//! Ledger transactions
//!
//! Immutable append-only records of balance movements. Once persisted a
//! transaction is never updated or deleted; corrections require a new
//! offsetting entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DomainError, Money};

/// Movement direction for double-entry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEBIT" => Some(TransactionType::Debit),
            "CREDIT" => Some(TransactionType::Credit),
            _ => None,
        }
    }
}

/// A single immutable ledger entry.
///
/// Created exclusively as a byproduct of an Account debit/credit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
    account_id: Uuid,
    #[serde(rename = "type")]
    entry_type: TransactionType,
    amount: Money,
    description: String,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new ledger entry. The amount must be strictly positive.
    pub fn new(
        id: Uuid,
        account_id: Uuid,
        entry_type: TransactionType,
        amount: Money,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if !amount.is_positive() {
            return Err(DomainError::InvalidArgument(format!(
                "transaction amount must be positive (got {amount})"
            )));
        }

        Ok(Self {
            id,
            account_id,
            entry_type,
            amount,
            description: description.into(),
            created_at: Utc::now(),
        })
    }

    /// Rehydrate an entry from its persisted form.
    pub fn from_stored(
        id: Uuid,
        account_id: Uuid,
        entry_type: TransactionType,
        amount: Money,
        description: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            entry_type,
            amount,
            description,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn entry_type(&self) -> TransactionType {
        self.entry_type
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

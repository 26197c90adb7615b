//! Use case input commands

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Money;

/// Request to move funds between two accounts. The idempotency key is
/// chosen by the caller and makes retries of the same intent safe.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferFundsCommand {
    pub source_account_id: Uuid,
    pub target_account_id: Uuid,
    pub amount: Money,
    pub idempotency_key: String,
}

/// Request to open an account for an existing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAccountCommand {
    pub customer_id: Uuid,
    pub initial_deposit: Money,
}

/// Request to close an account. The balance must already be zero.
#[derive(Debug, Clone, Deserialize)]
pub struct CloseAccountCommand {
    pub account_id: Uuid,
    pub reason: String,
}

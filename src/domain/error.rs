//! Domain error taxonomy
//!
//! Every domain error carries a stable machine-readable code alongside the
//! human-readable message. Callers must not assume balances changed unless
//! the operation returned success.

use thiserror::Error;
use uuid::Uuid;

use super::Money;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Malformed or missing required input, detected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Debit/credit attempted on a non-ACTIVE account
    #[error("Account is not active")]
    AccountNotActive,

    /// Balance does not strictly exceed the requested debit
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    /// Close attempted on an account with a remaining balance
    #[error("Cannot close account with remaining balance of {balance}")]
    AccountNotEmpty { balance: Money },

    /// State transition attempted on a non-PENDING transfer
    #[error("Transfer cannot change state from {current}")]
    InvalidTransferState { current: String },

    #[error("Source account not found: {0}")]
    SourceNotFound(Uuid),

    #[error("Target account not found: {0}")]
    TargetNotFound(Uuid),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Owning customer does not exist (checked before account open)
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error("Source and target accounts must be different")]
    SameAccountTransfer,

    #[error("Transfer amount must be positive (got {0})")]
    InvalidAmount(Money),

    /// Concurrent write detected at the persistence boundary
    #[error("Optimistic lock conflict on account {account_id}: expected version {expected}")]
    OptimisticLockConflict { account_id: Uuid, expected: i64 },

    /// Unanticipated failure during orchestration; cause preserved in logs
    #[error("Unexpected system error: {0}")]
    SystemError(String),
}

impl DomainError {
    /// Stable machine-readable code for API mapping and audit records.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidArgument(_) => "INVALID_ARGUMENT",
            DomainError::AccountNotActive => "ACCOUNT_NOT_ACTIVE",
            DomainError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            DomainError::AccountNotEmpty { .. } => "ACCOUNT_NOT_EMPTY",
            DomainError::InvalidTransferState { .. } => "INVALID_TRANSFER_STATE",
            DomainError::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            DomainError::TargetNotFound(_) => "TARGET_NOT_FOUND",
            DomainError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            DomainError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            DomainError::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            DomainError::InvalidAmount(_) => "INVALID_AMOUNT",
            DomainError::OptimisticLockConflict { .. } => "OPTIMISTIC_LOCK_CONFLICT",
            DomainError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Check if this is a deterministic client-side error (retrying the same
    /// request cannot succeed).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            DomainError::OptimisticLockConflict { .. } | DomainError::SystemError(_)
        )
    }

    /// Check if this is a concurrency conflict (an external retry may help).
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::OptimisticLockConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_codes_are_stable() {
        let err = DomainError::InsufficientFunds {
            balance: Money::of(dec!(10.00)),
            requested: Money::of(dec!(10.00)),
        };
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert!(err.is_client_error());
        assert!(!err.is_conflict());

        let err = DomainError::OptimisticLockConflict {
            account_id: Uuid::new_v4(),
            expected: 3,
        };
        assert_eq!(err.code(), "OPTIMISTIC_LOCK_CONFLICT");
        assert!(!err.is_client_error());
        assert!(err.is_conflict());
    }

    #[test]
    fn test_message_carries_amounts() {
        let err = DomainError::InsufficientFunds {
            balance: Money::of(dec!(10.00)),
            requested: Money::of(dec!(25.00)),
        };
        let message = err.to_string();
        assert!(message.contains("10.00"));
        assert!(message.contains("25.00"));
    }
}

//! Transfer aggregate
//!
//! Tracks the lifecycle of one cross-account movement intent as a strict
//! state machine: PENDING -> COMPLETED | FAILED. Terminal states are
//! immutable; the record is never deleted, it is the permanent audit trail
//! of the attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{DomainError, DomainEvent, EventKind, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransferStatus::Pending),
            "COMPLETED" => Some(TransferStatus::Completed),
            "FAILED" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate modeling one idempotency-keyed transfer attempt.
#[derive(Debug, Clone)]
pub struct Transfer {
    id: Uuid,
    source_account_id: Uuid,
    target_account_id: Uuid,
    amount: Money,
    idempotency_key: String,
    status: TransferStatus,
    failure_code: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Transfer {
    /// Record a new transfer intent in PENDING state.
    pub fn open(
        id: Uuid,
        source_account_id: Uuid,
        target_account_id: Uuid,
        amount: Money,
        idempotency_key: String,
    ) -> Result<Self, DomainError> {
        if idempotency_key.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "idempotency key is required".to_string(),
            ));
        }
        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(amount));
        }

        Ok(Self {
            id,
            source_account_id,
            target_account_id,
            amount,
            idempotency_key,
            status: TransferStatus::Pending,
            failure_code: None,
            failure_reason: None,
            created_at: Utc::now(),
            events: Vec::new(),
        })
    }

    /// Rehydrate a transfer from its persisted form (empty event buffer).
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: Uuid,
        source_account_id: Uuid,
        target_account_id: Uuid,
        amount: Money,
        idempotency_key: String,
        status: TransferStatus,
        failure_code: Option<String>,
        failure_reason: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            source_account_id,
            target_account_id,
            amount,
            idempotency_key,
            status,
            failure_code,
            failure_reason,
            created_at,
            events: Vec::new(),
        }
    }

    /// Transition to COMPLETED. Final; emits `TransferCompleted`.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = TransferStatus::Completed;
        self.events
            .push(DomainEvent::new(EventKind::TransferCompleted {
                transfer_id: self.id,
                source_account_id: self.source_account_id,
                target_account_id: self.target_account_id,
                amount: self.amount,
            }));
        Ok(())
    }

    /// Transition to FAILED with diagnostic metadata. Final; emits
    /// `TransferFailed`.
    pub fn fail(&mut self, code: &str, reason: &str) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = TransferStatus::Failed;
        self.failure_code = Some(code.to_string());
        self.failure_reason = Some(reason.to_string());
        self.events.push(DomainEvent::new(EventKind::TransferFailed {
            transfer_id: self.id,
            failure_code: code.to_string(),
            failure_reason: reason.to_string(),
        }));
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status != TransferStatus::Pending {
            return Err(DomainError::InvalidTransferState {
                current: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// Drain the buffered domain events. Safe to call when empty.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_account_id(&self) -> Uuid {
        self.source_account_id
    }

    pub fn target_account_id(&self) -> Uuid {
        self.target_account_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn failure_code(&self) -> Option<&str> {
        self.failure_code.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_transfer() -> Transfer {
        Transfer::open(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::of(dec!(40.00)),
            "key-1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_open_requires_positive_amount() {
        let result = Transfer::open(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::zero(),
            "key-1".to_string(),
        );
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_open_requires_idempotency_key() {
        let result = Transfer::open(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::of(dec!(1.00)),
            "   ".to_string(),
        );
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_complete_emits_event_with_full_context() {
        let mut transfer = pending_transfer();
        let (source, target) = (transfer.source_account_id(), transfer.target_account_id());

        transfer.complete().unwrap();
        assert_eq!(transfer.status(), TransferStatus::Completed);

        let events = transfer.pull_events();
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::TransferCompleted {
                source_account_id,
                target_account_id,
                amount,
                ..
            } => {
                assert_eq!(*source_account_id, source);
                assert_eq!(*target_account_id, target);
                assert_eq!(*amount, Money::of(dec!(40.00)));
            }
            other => panic!("expected TransferCompleted, got {other:?}"),
        }
    }

    #[test]
    fn test_fail_records_diagnostics() {
        let mut transfer = pending_transfer();

        transfer
            .fail("INSUFFICIENT_FUNDS", "Insufficient funds: balance 10.00")
            .unwrap();

        assert_eq!(transfer.status(), TransferStatus::Failed);
        assert_eq!(transfer.failure_code(), Some("INSUFFICIENT_FUNDS"));
        assert!(transfer.failure_reason().unwrap().contains("10.00"));
        assert_eq!(transfer.pull_events()[0].event_type(), "TransferFailed");
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut completed = pending_transfer();
        completed.complete().unwrap();
        assert!(matches!(
            completed.complete(),
            Err(DomainError::InvalidTransferState { .. })
        ));
        assert!(matches!(
            completed.fail("X", "y"),
            Err(DomainError::InvalidTransferState { .. })
        ));

        let mut failed = pending_transfer();
        failed.fail("X", "y").unwrap();
        assert!(matches!(
            failed.complete(),
            Err(DomainError::InvalidTransferState { .. })
        ));
    }
}

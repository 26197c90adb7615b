//! Domain events
//!
//! Immutable facts emitted by aggregates. Aggregates buffer them internally
//! and the use case drains (pulls) them exactly once after the owning unit
//! of work has committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Money;

/// Envelope for a single domain event instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique identifier of this event instance
    pub event_id: Uuid,

    /// When the business fact occurred (UTC)
    pub occurred_at: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: EventKind,
}

/// The typed payload of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    AccountOpened {
        account_id: Uuid,
        customer_id: Uuid,
        initial_balance: Money,
    },

    AccountDebited {
        account_id: Uuid,
        amount: Money,
    },

    AccountCredited {
        account_id: Uuid,
        amount: Money,
    },

    AccountClosed {
        account_id: Uuid,
        reason: String,
    },

    TransferCompleted {
        transfer_id: Uuid,
        source_account_id: Uuid,
        target_account_id: Uuid,
        amount: Money,
    },

    TransferFailed {
        transfer_id: Uuid,
        failure_code: String,
        failure_reason: String,
    },
}

impl DomainEvent {
    /// Wrap a payload with a fresh event ID and the current timestamp.
    pub fn new(kind: EventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
        }
    }

    /// Technical name of the event, used for logging and serialization.
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::AccountOpened { .. } => "AccountOpened",
            EventKind::AccountDebited { .. } => "AccountDebited",
            EventKind::AccountCredited { .. } => "AccountCredited",
            EventKind::AccountClosed { .. } => "AccountClosed",
            EventKind::TransferCompleted { .. } => "TransferCompleted",
            EventKind::TransferFailed { .. } => "TransferFailed",
        }
    }

    /// ID of the aggregate that produced this event.
    pub fn aggregate_id(&self) -> Uuid {
        match self.kind {
            EventKind::AccountOpened { account_id, .. } => account_id,
            EventKind::AccountDebited { account_id, .. } => account_id,
            EventKind::AccountCredited { account_id, .. } => account_id,
            EventKind::AccountClosed { account_id, .. } => account_id,
            EventKind::TransferCompleted { transfer_id, .. } => transfer_id,
            EventKind::TransferFailed { transfer_id, .. } => transfer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_serialization() {
        let account_id = Uuid::new_v4();
        let event = DomainEvent::new(EventKind::AccountCredited {
            account_id,
            amount: Money::of(dec!(40.00)),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("AccountCredited"));
        assert!(json.contains("40.00"));

        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), "AccountCredited");
        assert_eq!(back.aggregate_id(), account_id);
    }

    #[test]
    fn test_aggregate_id_points_at_producer() {
        let transfer_id = Uuid::new_v4();
        let event = DomainEvent::new(EventKind::TransferFailed {
            transfer_id,
            failure_code: "INSUFFICIENT_FUNDS".to_string(),
            failure_reason: "Insufficient funds".to_string(),
        });

        assert_eq!(event.aggregate_id(), transfer_id);
        assert_eq!(event.event_type(), "TransferFailed");
    }
}

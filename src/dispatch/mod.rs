//! Domain event dispatch
//!
//! Events pulled from aggregates are handed to a dispatcher strictly after
//! the owning transaction has committed, so subscribers never observe a
//! fact that later rolls back. Dispatch failures are the dispatcher's
//! problem; they never undo a committed transfer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// Post-commit event sink.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: &DomainEvent);

    /// Dispatch a batch in order. The default keeps per-event ordering.
    async fn dispatch_all(&self, events: &[DomainEvent]) {
        for event in events {
            self.dispatch(event).await;
        }
    }
}

/// Dispatcher that emits each event as a structured log line. The default
/// production wiring until a real subscriber (outbox, message bus) exists.
#[derive(Debug, Clone, Default)]
pub struct TracingEventDispatcher;

#[async_trait]
impl EventDispatcher for TracingEventDispatcher {
    async fn dispatch(&self, event: &DomainEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(
                event_type = event.event_type(),
                aggregate_id = %event.aggregate_id(),
                event_id = %event.event_id,
                %payload,
                "domain event"
            ),
            Err(err) => tracing::error!(
                event_type = event.event_type(),
                aggregate_id = %event.aggregate_id(),
                error = %err,
                "failed to serialize domain event"
            ),
        }
    }
}

/// Dispatcher that records every event it sees. Test double for asserting
/// on dispatch order and post-commit-only delivery.
#[derive(Debug, Clone, Default)]
pub struct CollectingEventDispatcher {
    seen: Arc<Mutex<Vec<DomainEvent>>>,
}

impl CollectingEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything dispatched so far, in dispatch order.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(DomainEvent::event_type).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

#[async_trait]
impl EventDispatcher for CollectingEventDispatcher {
    async fn dispatch(&self, event: &DomainEvent) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, Money};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_collecting_dispatcher_preserves_order() {
        let dispatcher = CollectingEventDispatcher::new();
        let account_id = Uuid::new_v4();

        let first = DomainEvent::new(EventKind::AccountDebited {
            account_id,
            amount: Money::of(dec!(10.00)),
        });
        let second = DomainEvent::new(EventKind::AccountCredited {
            account_id,
            amount: Money::of(dec!(10.00)),
        });

        dispatcher.dispatch_all(&[first.clone(), second.clone()]).await;

        assert_eq!(dispatcher.events(), vec![first, second]);
        assert_eq!(
            dispatcher.event_types(),
            vec!["AccountDebited", "AccountCredited"]
        );
    }
}

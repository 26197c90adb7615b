//! Transfer audit trail
//!
//! Writes the PENDING record before the money moves and flips it to FAILED
//! when the attempt dies. Each call commits on its own, independent of the
//! main transfer transaction, so a rolled-back transfer still leaves its
//! audit trace behind.

use std::sync::Arc;
use uuid::Uuid;

use crate::aggregate::Transfer;
use crate::repository::{RepositoryError, TransferRepository};

pub struct TransferAuditService<S> {
    store: Arc<S>,
}

impl<S> TransferAuditService<S>
where
    S: TransferRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist the PENDING record. A `DuplicateIdempotencyKey` error here
    /// means another attempt with the same key already got this far; the
    /// caller decides what that means.
    pub async fn record_pending(&self, transfer: &Transfer) -> Result<(), RepositoryError> {
        self.store.save(transfer).await?;
        tracing::debug!(
            transfer_id = %transfer.id(),
            idempotency_key = transfer.idempotency_key(),
            "transfer recorded as PENDING"
        );
        Ok(())
    }

    /// Flip a PENDING record to FAILED with the failure cause. Best effort:
    /// a stored record that is already terminal is left untouched.
    pub async fn mark_failed(
        &self,
        transfer_id: Uuid,
        code: &str,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        let Some(mut transfer) = self.store.find_by_id(transfer_id).await? else {
            return Err(RepositoryError::Storage(format!(
                "transfer {transfer_id} vanished before it could be marked FAILED"
            )));
        };

        if transfer.fail(code, reason).is_err() {
            // Already terminal; nothing to record.
            return Ok(());
        }

        self.store.save(&transfer).await?;
        tracing::warn!(
            transfer_id = %transfer_id,
            failure_code = code,
            failure_reason = reason,
            "transfer marked as FAILED"
        );
        Ok(())
    }
}

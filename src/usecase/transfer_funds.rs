//! Transfer funds orchestration
//!
//! The audit record goes first: a PENDING transfer row commits on its own
//! before any account is touched, so every attempt leaves a trace even when
//! the money never moves. The balance movement then commits as one atomic
//! unit, and domain events are dispatched strictly after that commit.

use std::sync::Arc;
use uuid::Uuid;

use crate::aggregate::Transfer;
use crate::dispatch::EventDispatcher;
use crate::domain::DomainError;
use crate::repository::{
    AccountRepository, RepositoryError, TransferRepository, TransferUnitOfWork,
};

use super::{storage_error, TransferAuditService, TransferFundsCommand};

pub struct TransferFundsUseCase<S, D> {
    store: Arc<S>,
    audit: TransferAuditService<S>,
    dispatcher: Arc<D>,
}

impl<S, D> TransferFundsUseCase<S, D>
where
    S: AccountRepository + TransferRepository + TransferUnitOfWork,
    D: EventDispatcher,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<D>) -> Self {
        Self {
            audit: TransferAuditService::new(store.clone()),
            store,
            dispatcher,
        }
    }

    /// Move funds between two accounts.
    ///
    /// Resubmitting a command under an idempotency key that was already
    /// accepted returns `Ok` without moving funds again.
    pub async fn execute(&self, command: TransferFundsCommand) -> Result<(), DomainError> {
        if command.source_account_id == command.target_account_id {
            return Err(DomainError::SameAccountTransfer);
        }

        // Idempotency check before any write. A record under this key,
        // whatever its state, means the intent was already accepted.
        if let Some(existing) =
            TransferRepository::find_by_idempotency_key(self.store.as_ref(), &command.idempotency_key)
                .await
                .map_err(storage_error)?
        {
            tracing::info!(
                transfer_id = %existing.id(),
                idempotency_key = existing.idempotency_key(),
                status = %existing.status(),
                "transfer already submitted under this idempotency key, skipping"
            );
            return Ok(());
        }

        let mut transfer = Transfer::open(
            Uuid::new_v4(),
            command.source_account_id,
            command.target_account_id,
            command.amount,
            command.idempotency_key,
        )?;

        // Own commit, before any account is read. The unique constraint on
        // the key arbitrates duplicates that race past the check above.
        match self.audit.record_pending(&transfer).await {
            Ok(()) => {}
            Err(RepositoryError::DuplicateIdempotencyKey(key)) => {
                tracing::info!(
                    idempotency_key = %key,
                    "transfer already submitted under this idempotency key, skipping"
                );
                return Ok(());
            }
            Err(other) => return Err(storage_error(other)),
        }

        let mut source = match self.load_account(command.source_account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(self
                    .fail_transfer(
                        transfer.id(),
                        DomainError::SourceNotFound(command.source_account_id),
                    )
                    .await);
            }
            Err(err) => return Err(self.fail_transfer(transfer.id(), err).await),
        };

        let mut target = match self.load_account(command.target_account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(self
                    .fail_transfer(
                        transfer.id(),
                        DomainError::TargetNotFound(command.target_account_id),
                    )
                    .await);
            }
            Err(err) => return Err(self.fail_transfer(transfer.id(), err).await),
        };

        let description = format!("Transfer {}", transfer.id());

        let debit_entry = match source.debit(command.amount, description.clone()) {
            Ok(entry) => entry,
            Err(err) => return Err(self.fail_transfer(transfer.id(), err).await),
        };
        let credit_entry = match target.credit(command.amount, description) {
            Ok(entry) => entry,
            Err(err) => return Err(self.fail_transfer(transfer.id(), err).await),
        };

        // Cannot fail: the transfer was opened PENDING a few lines up.
        transfer.complete()?;

        let entries = [debit_entry, credit_entry];
        if let Err(err) = self
            .store
            .commit_transfer(&source, &target, &transfer, &entries)
            .await
        {
            let err = storage_error(err);
            return Err(self.fail_transfer(transfer.id(), err).await);
        }

        // Strictly post-commit. One batch, in aggregate order: source,
        // target, transfer.
        let mut events = source.pull_events();
        events.extend(target.pull_events());
        events.extend(transfer.pull_events());
        self.dispatcher.dispatch_all(&events).await;

        tracing::info!(
            transfer_id = %transfer.id(),
            source_account_id = %source.id(),
            target_account_id = %target.id(),
            amount = %command.amount,
            "transfer completed"
        );

        Ok(())
    }

    async fn load_account(
        &self,
        id: Uuid,
    ) -> Result<Option<crate::aggregate::Account>, DomainError> {
        AccountRepository::find_by_id(self.store.as_ref(), id)
            .await
            .map_err(storage_error)
    }

    /// Record the failure on the audit trail and hand the original error
    /// back. The FAILED write is best effort; losing it never masks the
    /// reason the transfer died.
    async fn fail_transfer(&self, transfer_id: Uuid, err: DomainError) -> DomainError {
        if let Err(audit_err) = self
            .audit
            .mark_failed(transfer_id, err.code(), &err.to_string())
            .await
        {
            tracing::error!(
                transfer_id = %transfer_id,
                error = %audit_err,
                "failed to mark transfer as FAILED"
            );
        }
        err
    }
}

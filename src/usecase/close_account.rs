//! Close account orchestration

use std::sync::Arc;

use crate::dispatch::EventDispatcher;
use crate::domain::DomainError;
use crate::repository::AccountRepository;

use super::{storage_error, CloseAccountCommand};

pub struct CloseAccountUseCase<S, D> {
    store: Arc<S>,
    dispatcher: Arc<D>,
}

impl<S, D> CloseAccountUseCase<S, D>
where
    S: AccountRepository,
    D: EventDispatcher,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<D>) -> Self {
        Self { store, dispatcher }
    }

    /// Close an account. The balance must be zero. Closing an already
    /// closed account is a no-op and succeeds.
    pub async fn execute(&self, command: CloseAccountCommand) -> Result<(), DomainError> {
        let mut account = self
            .store
            .find_by_id(command.account_id)
            .await
            .map_err(storage_error)?
            .ok_or(DomainError::AccountNotFound(command.account_id))?;

        if account.is_closed() {
            tracing::debug!(account_id = %account.id(), "account already closed");
            return Ok(());
        }

        account.close(command.reason)?;

        self.store
            .save(&account)
            .await
            .map_err(storage_error)?;

        self.dispatcher.dispatch_all(&account.pull_events()).await;

        tracing::info!(account_id = %account.id(), "account closed");
        Ok(())
    }
}

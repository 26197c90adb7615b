//! Open account orchestration

use std::sync::Arc;

use crate::aggregate::Account;
use crate::dispatch::EventDispatcher;
use crate::domain::DomainError;
use crate::repository::{AccountRepository, UserRepository};
use uuid::Uuid;

use super::{storage_error, OpenAccountCommand};

pub struct OpenAccountUseCase<S, D> {
    store: Arc<S>,
    dispatcher: Arc<D>,
}

impl<S, D> OpenAccountUseCase<S, D>
where
    S: AccountRepository + UserRepository,
    D: EventDispatcher,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<D>) -> Self {
        Self { store, dispatcher }
    }

    /// Open an account for an existing customer, optionally seeded with an
    /// initial deposit. Returns the new account's id; callers reload
    /// through the repository to get the persisted state.
    pub async fn execute(&self, command: OpenAccountCommand) -> Result<Uuid, DomainError> {
        let customer = UserRepository::find_by_id(self.store.as_ref(), command.customer_id)
            .await
            .map_err(storage_error)?
            .ok_or(DomainError::CustomerNotFound(command.customer_id))?;

        let mut account =
            Account::open(Uuid::new_v4(), customer.id(), command.initial_deposit)?;

        AccountRepository::save(self.store.as_ref(), &account)
            .await
            .map_err(storage_error)?;

        self.dispatcher.dispatch_all(&account.pull_events()).await;

        tracing::info!(
            account_id = %account.id(),
            customer_id = %customer.id(),
            account_number = account.account_number(),
            "account opened"
        );

        Ok(account.id())
    }
}

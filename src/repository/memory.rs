//! In-memory ledger store
//!
//! Intended for tests/dev. One lock guards all tables so the transfer unit
//! of work is genuinely atomic, with the same compare-and-swap and
//! idempotency-uniqueness semantics as the Postgres store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::{Account, AccountStatus, Transfer, TransferStatus, User};
use crate::domain::{Money, Transaction};

use super::{
    AccountRepository, RepositoryError, TransactionRepository, TransferRepository,
    TransferUnitOfWork, UserRepository,
};

#[derive(Debug, Clone)]
struct AccountRow {
    customer_id: Uuid,
    account_number: String,
    balance: Money,
    status: AccountStatus,
    version: i64,
}

#[derive(Debug, Clone)]
struct TransferRow {
    source_account_id: Uuid,
    target_account_id: Uuid,
    amount: Money,
    idempotency_key: String,
    status: TransferStatus,
    failure_code: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, AccountRow>,
    transfers: HashMap<Uuid, TransferRow>,
    /// idempotency_key -> transfer id (uniqueness constraint)
    transfer_keys: HashMap<String, Uuid>,
    entries: Vec<Transaction>,
    users: HashMap<Uuid, User>,
}

/// In-memory implementation of all persistence ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, RepositoryError> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }

    /// Force the stored version of an account, simulating a concurrent
    /// writer. Test hook.
    pub fn bump_account_version(&self, account_id: Uuid) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        match inner.accounts.get_mut(&account_id) {
            Some(row) => {
                row.version += 1;
                Ok(())
            }
            None => Err(RepositoryError::Storage(format!(
                "no account {account_id} to bump"
            ))),
        }
    }

    fn check_account_version(inner: &Inner, account: &Account) -> Result<(), RepositoryError> {
        let conflict = || RepositoryError::VersionConflict {
            account_id: account.id(),
            expected: account.version(),
        };

        match inner.accounts.get(&account.id()) {
            Some(row) if row.version != account.version() => Err(conflict()),
            None if account.version() != 0 => Err(conflict()),
            _ => Ok(()),
        }
    }

    fn apply_account(inner: &mut Inner, account: &Account) {
        inner.accounts.insert(
            account.id(),
            AccountRow {
                customer_id: account.customer_id(),
                account_number: account.account_number().to_string(),
                balance: account.balance(),
                status: account.status(),
                version: account.version() + 1,
            },
        );
    }

    fn check_idempotency_key(inner: &Inner, transfer: &Transfer) -> Result<(), RepositoryError> {
        match inner.transfer_keys.get(transfer.idempotency_key()) {
            Some(existing) if *existing != transfer.id() => Err(
                RepositoryError::DuplicateIdempotencyKey(transfer.idempotency_key().to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn apply_transfer(inner: &mut Inner, transfer: &Transfer) {
        inner
            .transfer_keys
            .insert(transfer.idempotency_key().to_string(), transfer.id());
        inner.transfers.insert(
            transfer.id(),
            TransferRow {
                source_account_id: transfer.source_account_id(),
                target_account_id: transfer.target_account_id(),
                amount: transfer.amount(),
                idempotency_key: transfer.idempotency_key().to_string(),
                status: transfer.status(),
                failure_code: transfer.failure_code().map(str::to_string),
                failure_reason: transfer.failure_reason().map(str::to_string),
                created_at: transfer.created_at(),
            },
        );
    }

    fn rehydrate_transfer(id: Uuid, row: &TransferRow) -> Transfer {
        Transfer::from_stored(
            id,
            row.source_account_id,
            row.target_account_id,
            row.amount,
            row.idempotency_key.clone(),
            row.status,
            row.failure_code.clone(),
            row.failure_reason.clone(),
            row.created_at,
        )
    }
}

#[async_trait]
impl AccountRepository for InMemoryLedgerStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(inner.accounts.get(&id).map(|row| {
            Account::from_stored(
                id,
                row.customer_id,
                row.account_number.clone(),
                row.balance,
                row.status,
                row.version,
            )
        }))
    }

    async fn save(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        Self::check_account_version(&inner, account)?;
        Self::apply_account(&mut inner, account);
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for InMemoryLedgerStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(inner
            .transfers
            .get(&id)
            .map(|row| Self::rehydrate_transfer(id, row)))
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transfer>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(inner.transfer_keys.get(key).and_then(|id| {
            inner
                .transfers
                .get(id)
                .map(|row| Self::rehydrate_transfer(*id, row))
        }))
    }

    async fn save(&self, transfer: &Transfer) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        Self::check_idempotency_key(&inner, transfer)?;
        Self::apply_transfer(&mut inner, transfer);
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryLedgerStore {
    async fn save(&self, entry: &Transaction) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        inner.entries.push(entry.clone());
        Ok(())
    }

    async fn find_by_account_id(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        // Insertion order doubles as creation order here.
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.account_id() == account_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(inner.entries.iter().find(|e| e.id() == id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryLedgerStore {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        inner.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<User>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;
        Ok(inner.users.values().find(|u| u.tax_id() == tax_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;
        Ok(inner.users.values().find(|u| u.email() == email).cloned())
    }

    async fn exists_by_tax_id(&self, tax_id: &str) -> Result<bool, RepositoryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;
        Ok(inner.users.values().any(|u| u.tax_id() == tax_id))
    }
}

#[async_trait]
impl TransferUnitOfWork for InMemoryLedgerStore {
    async fn commit_transfer(
        &self,
        source: &Account,
        target: &Account,
        transfer: &Transfer,
        entries: &[Transaction],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;

        // Validate every write before mutating anything, so a conflict
        // leaves the store untouched.
        Self::check_account_version(&inner, source)?;
        Self::check_account_version(&inner, target)?;
        Self::check_idempotency_key(&inner, transfer)?;

        Self::apply_account(&mut inner, source);
        Self::apply_account(&mut inner, target);
        Self::apply_transfer(&mut inner, transfer);
        inner.entries.extend_from_slice(entries);

        Ok(())
    }
}

//! Persistence ports
//!
//! Storage-agnostic contracts for aggregate persistence. The domain defines
//! the contracts; `postgres` implements them for production and `memory`
//! provides an atomic in-memory fake for tests.

mod error;
pub mod memory;
pub mod postgres;

pub use error::RepositoryError;
pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{Account, Transfer, User};
use crate::domain::Transaction;

/// Account aggregate persistence.
///
/// `save` performs a compare-and-swap on the account version: a fresh
/// aggregate (version 0) is inserted at version 1, an existing one is
/// updated only when the stored version still matches, otherwise the write
/// fails with `RepositoryError::VersionConflict`.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError>;
    async fn save(&self, account: &Account) -> Result<(), RepositoryError>;
}

/// Transfer aggregate persistence.
///
/// The idempotency key carries a storage-level uniqueness constraint;
/// inserting a second transfer under an existing key fails with
/// `RepositoryError::DuplicateIdempotencyKey`. Each `save` call commits as
/// its own unit of work, which is what makes the audit-first pattern
/// independent of the main transaction's outcome.
#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, RepositoryError>;
    async fn find_by_idempotency_key(&self, key: &str)
        -> Result<Option<Transfer>, RepositoryError>;
    async fn save(&self, transfer: &Transfer) -> Result<(), RepositoryError>;
}

/// Ledger entry persistence. Insert-only: entries are immutable facts.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn save(&self, entry: &Transaction) -> Result<(), RepositoryError>;
    /// Entries for one account, ordered by creation time.
    async fn find_by_account_id(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepositoryError>;
}

/// User identity lookups. Consumed to validate account ownership before an
/// account is opened; never mutated by the transfer flow.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn exists_by_tax_id(&self, tax_id: &str) -> Result<bool, RepositoryError>;
}

/// The single atomic unit of work for a completed transfer: both account
/// writes (version-checked), the transfer outcome, and the ledger entries
/// commit together or not at all.
///
/// Returning `Ok` means the commit is durable; the caller's next statement
/// therefore runs strictly post-commit.
#[async_trait]
pub trait TransferUnitOfWork: Send + Sync {
    async fn commit_transfer(
        &self,
        source: &Account,
        target: &Account,
        transfer: &Transfer,
        entries: &[Transaction],
    ) -> Result<(), RepositoryError>;
}

//! ledger-core
//!
//! Transactional core of a minimal bank ledger: money, accounts, transfers,
//! the immutable transaction log, and the orchestration that moves funds
//! between accounts atomically with an audit trail and post-commit domain
//! events.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod repository;
pub mod telemetry;
pub mod usecase;

pub use config::Config;
pub use domain::{DomainError, DomainEvent, EventKind, Money, Transaction, TransactionType};
pub use aggregate::{Account, AccountStatus, Transfer, TransferStatus, User};
pub use dispatch::{CollectingEventDispatcher, EventDispatcher, TracingEventDispatcher};
pub use repository::{
    AccountRepository, InMemoryLedgerStore, PgLedgerStore, RepositoryError,
    TransactionRepository, TransferRepository, TransferUnitOfWork, UserRepository,
};
pub use usecase::{
    CloseAccountCommand, CloseAccountUseCase, OpenAccountCommand, OpenAccountUseCase,
    TransferFundsCommand, TransferFundsUseCase,
};

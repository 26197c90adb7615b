//! Domain module
//!
//! Core domain types: money, ledger transactions, events, and the error
//! taxonomy.

pub mod error;
pub mod events;
pub mod money;
pub mod transaction;

pub use error::DomainError;
pub use events::{DomainEvent, EventKind};
pub use money::Money;
pub use transaction::{Transaction, TransactionType};

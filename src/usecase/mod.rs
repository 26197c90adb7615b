//! Application use cases
//!
//! Orchestrators over the persistence ports and the event dispatcher. Each
//! use case owns one operation end to end: load aggregates, apply domain
//! behavior, persist, then dispatch the pulled events post-commit.

mod audit;
mod close_account;
mod commands;
mod open_account;
mod transfer_funds;

pub use audit::TransferAuditService;
pub use close_account::CloseAccountUseCase;
pub use commands::{CloseAccountCommand, OpenAccountCommand, TransferFundsCommand};
pub use open_account::OpenAccountUseCase;
pub use transfer_funds::TransferFundsUseCase;

use crate::domain::DomainError;
use crate::repository::RepositoryError;

/// Map a persistence failure into the domain taxonomy. Version conflicts
/// keep their identity so callers can retry; everything else is opaque to
/// the caller and logged here with full detail.
pub(crate) fn storage_error(err: RepositoryError) -> DomainError {
    match err {
        RepositoryError::VersionConflict {
            account_id,
            expected,
        } => DomainError::OptimisticLockConflict {
            account_id,
            expected,
        },
        other => {
            tracing::error!(error = %other, "storage failure");
            DomainError::SystemError(other.to_string())
        }
    }
}

//! Aggregate module
//!
//! Aggregate roots: all invariant checks for their data occur within their
//! own operations. State changes buffer domain events which the use case
//! drains after a successful commit (pull model).

pub mod account;
pub mod transfer;
pub mod user;

pub use account::{Account, AccountStatus};
pub use transfer::{Transfer, TransferStatus};
pub use user::User;

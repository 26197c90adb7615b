//! Account aggregate
//!
//! The consistency boundary for balance and status. The aggregate protects
//! its own invariants (balance never negative, movements only while ACTIVE,
//! CLOSED is terminal), produces ledger entries for every movement, and
//! buffers domain events until the use case pulls them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DomainError, DomainEvent, EventKind, Money, Transaction, TransactionType};

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Blocked,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Blocked => "BLOCKED",
            AccountStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(AccountStatus::Active),
            "BLOCKED" => Some(AccountStatus::Blocked),
            "CLOSED" => Some(AccountStatus::Closed),
            _ => None,
        }
    }
}

/// Bank account aggregate root.
#[derive(Debug, Clone)]
pub struct Account {
    id: Uuid,
    customer_id: Uuid,
    account_number: String,
    balance: Money,
    status: AccountStatus,
    /// Optimistic-lock counter; 0 until the first persisted write.
    version: i64,
    events: Vec<DomainEvent>,
}

impl Account {
    /// Open a new account with an initial deposit (>= 0).
    ///
    /// The new aggregate is ACTIVE, carries version 0 until first saved, and
    /// has an `AccountOpened` event buffered.
    pub fn open(id: Uuid, customer_id: Uuid, initial_deposit: Money) -> Result<Self, DomainError> {
        if initial_deposit.is_negative() {
            return Err(DomainError::InvalidArgument(format!(
                "initial deposit cannot be negative (got {initial_deposit})"
            )));
        }

        let account_number = format!("ACC-{}", &id.simple().to_string()[..12]);

        let mut account = Self {
            id,
            customer_id,
            account_number,
            balance: initial_deposit,
            status: AccountStatus::Active,
            version: 0,
            events: Vec::new(),
        };

        account.record(EventKind::AccountOpened {
            account_id: id,
            customer_id,
            initial_balance: initial_deposit,
        });

        Ok(account)
    }

    /// Rehydrate an account from its persisted form (empty event buffer).
    pub fn from_stored(
        id: Uuid,
        customer_id: Uuid,
        account_number: String,
        balance: Money,
        status: AccountStatus,
        version: i64,
    ) -> Self {
        Self {
            id,
            customer_id,
            account_number,
            balance,
            status,
            version,
            events: Vec::new(),
        }
    }

    /// Decrease the balance, producing a DEBIT ledger entry.
    ///
    /// The balance must strictly exceed the amount: a debit equal to the
    /// full balance is rejected as insufficient funds, so the balance stays
    /// above zero after every debit.
    pub fn debit(
        &mut self,
        amount: Money,
        description: impl Into<String>,
    ) -> Result<Transaction, DomainError> {
        self.ensure_active()?;

        if self.balance.is_less_than_or_equal(amount) {
            return Err(DomainError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }

        // Entry construction validates the amount before any state change.
        let entry = Transaction::new(
            Uuid::new_v4(),
            self.id,
            TransactionType::Debit,
            amount,
            description,
        )?;

        self.balance = self.balance.subtract(amount);
        self.record(EventKind::AccountDebited {
            account_id: self.id,
            amount,
        });

        Ok(entry)
    }

    /// Increase the balance, producing a CREDIT ledger entry.
    pub fn credit(
        &mut self,
        amount: Money,
        description: impl Into<String>,
    ) -> Result<Transaction, DomainError> {
        self.ensure_active()?;

        let entry = Transaction::new(
            Uuid::new_v4(),
            self.id,
            TransactionType::Credit,
            amount,
            description,
        )?;

        self.balance = self.balance.add(amount);
        self.record(EventKind::AccountCredited {
            account_id: self.id,
            amount,
        });

        Ok(entry)
    }

    /// Transition to CLOSED. Idempotent: closing an already-closed account
    /// is a no-op that emits no event. Requires a zero balance.
    pub fn close(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if self.status == AccountStatus::Closed {
            return Ok(());
        }

        if !self.balance.is_zero() {
            return Err(DomainError::AccountNotEmpty {
                balance: self.balance,
            });
        }

        self.status = AccountStatus::Closed;
        self.record(EventKind::AccountClosed {
            account_id: self.id,
            reason: reason.into(),
        });

        Ok(())
    }

    /// Drain the buffered domain events. Safe to call when empty.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != AccountStatus::Active {
            return Err(DomainError::AccountNotActive);
        }
        Ok(())
    }

    fn record(&mut self, kind: EventKind) {
        self.events.push(DomainEvent::new(kind));
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_closed(&self) -> bool {
        self.status == AccountStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn active_account(balance: Money) -> Account {
        Account::from_stored(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "ACC-TEST".to_string(),
            balance,
            AccountStatus::Active,
            1,
        )
    }

    #[test]
    fn test_open_emits_event() {
        let id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let mut account = Account::open(id, customer_id, Money::of(dec!(100.00))).unwrap();

        assert_eq!(account.status(), AccountStatus::Active);
        assert_eq!(account.balance(), Money::of(dec!(100.00)));
        assert_eq!(account.version(), 0);
        assert!(account.account_number().starts_with("ACC-"));

        let events = account.pull_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "AccountOpened");
        assert_eq!(events[0].aggregate_id(), id);

        // Buffer is drained after pulling
        assert!(account.pull_events().is_empty());
    }

    #[test]
    fn test_open_rejects_negative_deposit() {
        let result = Account::open(Uuid::new_v4(), Uuid::new_v4(), Money::of(dec!(-1.00)));
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_debit_produces_ledger_entry_and_event() {
        let mut account = active_account(Money::of(dec!(100.00)));

        let entry = account.debit(Money::of(dec!(40.00)), "Transfer out").unwrap();

        assert_eq!(account.balance(), Money::of(dec!(60.00)));
        assert_eq!(entry.entry_type(), TransactionType::Debit);
        assert_eq!(entry.amount(), Money::of(dec!(40.00)));
        assert_eq!(entry.account_id(), account.id());

        let events = account.pull_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "AccountDebited");
    }

    #[test]
    fn test_debit_equal_to_balance_is_insufficient() {
        // Strict inequality: the full balance is not spendable.
        let mut account = active_account(Money::of(dec!(10.00)));

        let result = account.debit(Money::of(dec!(10.00)), "drain");
        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
        assert_eq!(account.balance(), Money::of(dec!(10.00)));
        assert!(account.pull_events().is_empty());
    }

    #[test]
    fn test_credit_increases_balance() {
        let mut account = active_account(Money::zero());

        let entry = account.credit(Money::of(dec!(40.00)), "Transfer in").unwrap();

        assert_eq!(account.balance(), Money::of(dec!(40.00)));
        assert_eq!(entry.entry_type(), TransactionType::Credit);

        let events = account.pull_events();
        assert_eq!(events[0].event_type(), "AccountCredited");
    }

    #[test]
    fn test_movements_require_active_status() {
        for status in [AccountStatus::Blocked, AccountStatus::Closed] {
            let mut account = Account::from_stored(
                Uuid::new_v4(),
                Uuid::new_v4(),
                "ACC-TEST".to_string(),
                Money::of(dec!(50.00)),
                status,
                1,
            );

            assert!(matches!(
                account.debit(Money::of(dec!(1.00)), "x"),
                Err(DomainError::AccountNotActive)
            ));
            assert!(matches!(
                account.credit(Money::of(dec!(1.00)), "x"),
                Err(DomainError::AccountNotActive)
            ));
            assert_eq!(account.balance(), Money::of(dec!(50.00)));
        }
    }

    #[test]
    fn test_close_requires_zero_balance() {
        let mut account = active_account(Money::of(dec!(5.00)));

        let result = account.close("customer request");
        assert!(matches!(result, Err(DomainError::AccountNotEmpty { .. })));
        assert_eq!(account.status(), AccountStatus::Active);
    }

    #[test]
    fn test_close_emits_event_once() {
        let mut account = active_account(Money::zero());

        account.close("customer request").unwrap();
        assert!(account.is_closed());
        let events = account.pull_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "AccountClosed");

        // Second close is a silent no-op
        account.close("again").unwrap();
        assert!(account.pull_events().is_empty());
        assert!(account.is_closed());
    }
}

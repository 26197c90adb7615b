//! Common test utilities

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use ledger_core::{
    Account, AccountRepository, CollectingEventDispatcher, InMemoryLedgerStore, Money, User,
    UserRepository,
};

/// In-memory fixture: a store, a collecting dispatcher, and one seeded
/// customer that owns any accounts the test opens.
pub struct Fixture {
    pub store: Arc<InMemoryLedgerStore>,
    pub dispatcher: Arc<CollectingEventDispatcher>,
    pub customer_id: Uuid,
}

pub async fn fixture() -> Fixture {
    ledger_core::telemetry::try_init_tracing();

    let store = Arc::new(InMemoryLedgerStore::new());
    let dispatcher = Arc::new(CollectingEventDispatcher::new());

    let customer_id = Uuid::new_v4();
    let customer = User::new(customer_id, "Ada Lovelace", "ada@example.com", "TAX-001")
        .expect("valid customer");
    UserRepository::save(store.as_ref(), &customer)
        .await
        .expect("seed customer");

    Fixture {
        store,
        dispatcher,
        customer_id,
    }
}

impl Fixture {
    /// Seed an active account with the given balance, already persisted.
    /// Buffered events are drained so tests only observe what they cause.
    pub async fn seed_account(&self, balance: Decimal) -> Uuid {
        let mut account = Account::open(Uuid::new_v4(), self.customer_id, Money::of(balance))
            .expect("valid account");
        account.pull_events();
        AccountRepository::save(self.store.as_ref(), &account)
            .await
            .expect("seed account");
        account.id()
    }

    pub async fn balance_of(&self, account_id: Uuid) -> Money {
        AccountRepository::find_by_id(self.store.as_ref(), account_id)
            .await
            .expect("load account")
            .expect("account exists")
            .balance()
    }
}

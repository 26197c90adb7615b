//! Integration tests for the Postgres store
//!
//! These need a reachable database with the schema from migrations/
//! applied. Run them explicitly:
//!
//!     DATABASE_URL=postgres://... cargo test --test pg_store -- --ignored

use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use ledger_core::{
    Account, AccountRepository, Money, PgLedgerStore, RepositoryError, Transfer,
    TransferRepository, TransferUnitOfWork, User, UserRepository,
};

async fn setup_test_db() -> PgPool {
    ledger_core::telemetry::try_init_tracing();
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE account_transactions, transfers, accounts, users CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

async fn seed_account(store: &PgLedgerStore, balance: Money) -> Uuid {
    let customer_id = Uuid::new_v4();
    let customer = User::new(
        customer_id,
        "Test Customer",
        format!("{customer_id}@example.com"),
        format!("TAX-{customer_id}"),
    )
    .unwrap();
    UserRepository::save(store, &customer).await.unwrap();

    let mut account = Account::open(Uuid::new_v4(), customer_id, balance).unwrap();
    account.pull_events();
    AccountRepository::save(store, &account).await.unwrap();
    account.id()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_account_save_round_trip_with_version_bump() {
    let store = PgLedgerStore::new(setup_test_db().await);
    let account_id = seed_account(&store, Money::of(dec!(100.00))).await;

    let loaded = AccountRepository::find_by_id(&store, account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.version(), 1);
    assert_eq!(loaded.balance(), Money::of(dec!(100.00)));

    AccountRepository::save(&store, &loaded).await.unwrap();
    let reloaded = AccountRepository::find_by_id(&store, account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.version(), 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_stale_account_write_is_rejected() {
    let store = PgLedgerStore::new(setup_test_db().await);
    let account_id = seed_account(&store, Money::of(dec!(100.00))).await;

    let stale = AccountRepository::find_by_id(&store, account_id)
        .await
        .unwrap()
        .unwrap();

    // A concurrent writer bumps the version first.
    AccountRepository::save(&store, &stale).await.unwrap();

    let result = AccountRepository::save(&store, &stale).await;
    assert!(matches!(
        result,
        Err(RepositoryError::VersionConflict { .. })
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_idempotency_key_rejected() {
    let store = PgLedgerStore::new(setup_test_db().await);
    let source = seed_account(&store, Money::of(dec!(100.00))).await;
    let target = seed_account(&store, Money::zero()).await;

    let first = Transfer::open(
        Uuid::new_v4(),
        source,
        target,
        Money::of(dec!(5.00)),
        "pg-dup".to_string(),
    )
    .unwrap();
    TransferRepository::save(&store, &first).await.unwrap();

    let second = Transfer::open(
        Uuid::new_v4(),
        source,
        target,
        Money::of(dec!(5.00)),
        "pg-dup".to_string(),
    )
    .unwrap();
    let result = TransferRepository::save(&store, &second).await;
    assert!(matches!(
        result,
        Err(RepositoryError::DuplicateIdempotencyKey(_))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_commit_transfer_rolls_back_on_version_conflict() {
    let store = PgLedgerStore::new(setup_test_db().await);
    let source_id = seed_account(&store, Money::of(dec!(100.00))).await;
    let target_id = seed_account(&store, Money::zero()).await;

    let mut source = AccountRepository::find_by_id(&store, source_id)
        .await
        .unwrap()
        .unwrap();
    let mut target = AccountRepository::find_by_id(&store, target_id)
        .await
        .unwrap()
        .unwrap();

    let debit = source.debit(Money::of(dec!(40.00)), "out").unwrap();
    let credit = target.credit(Money::of(dec!(40.00)), "in").unwrap();
    let mut transfer = Transfer::open(
        Uuid::new_v4(),
        source_id,
        target_id,
        Money::of(dec!(40.00)),
        "pg-atomic".to_string(),
    )
    .unwrap();
    transfer.complete().unwrap();

    // A concurrent writer bumps the target version behind our back.
    let concurrent = AccountRepository::find_by_id(&store, target_id)
        .await
        .unwrap()
        .unwrap();
    AccountRepository::save(&store, &concurrent).await.unwrap();

    let result = store
        .commit_transfer(&source, &target, &transfer, &[debit, credit])
        .await;
    assert!(matches!(
        result,
        Err(RepositoryError::VersionConflict { .. })
    ));

    // The source debit rolled back with the rest of the transaction.
    let stored_source = AccountRepository::find_by_id(&store, source_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_source.balance(), Money::of(dec!(100.00)));
}

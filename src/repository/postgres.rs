//! Postgres ledger store
//!
//! Implements every persistence port on one `PgPool`. Account writes use a
//! compare-and-swap upsert on the version column; transfer writes rely on
//! the unique index over the idempotency key; the transfer unit of work
//! wraps all of it in a single database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::aggregate::{Account, AccountStatus, Transfer, TransferStatus, User};
use crate::domain::{Money, Transaction, TransactionType};

use super::{
    AccountRepository, RepositoryError, TransactionRepository, TransferRepository,
    TransferUnitOfWork, UserRepository,
};

// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

type AccountRow = (Uuid, String, Decimal, String, i64);
type TransferRow = (
    Uuid,
    Uuid,
    Uuid,
    Decimal,
    String,
    String,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);
type TransactionRow = (Uuid, Uuid, String, Decimal, String, DateTime<Utc>);

/// Postgres-backed implementation of all persistence ports.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// CAS upsert on the version column. A fresh aggregate (version 0)
    /// inserts at version 1; otherwise the update only lands when the
    /// stored version still matches. Zero rows affected means a concurrent
    /// writer won.
    async fn upsert_account<'e, E>(
        executor: E,
        account: &Account,
    ) -> Result<(), RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, customer_id, account_number, balance, status, version)
            VALUES ($1, $2, $3, $4, $5, $6 + 1)
            ON CONFLICT (id) DO UPDATE
            SET balance = EXCLUDED.balance,
                status = EXCLUDED.status,
                version = accounts.version + 1
            WHERE accounts.version = $6
            "#,
        )
        .bind(account.id())
        .bind(account.customer_id())
        .bind(account.account_number())
        .bind(account.balance().value())
        .bind(account.status().as_str())
        .bind(account.version())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VersionConflict {
                account_id: account.id(),
                expected: account.version(),
            });
        }

        Ok(())
    }

    async fn upsert_transfer<'e, E>(
        executor: E,
        transfer: &Transfer,
    ) -> Result<(), RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO transfers (
                id, source_account_id, target_account_id, amount,
                idempotency_key, status, failure_code, failure_reason, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                failure_code = EXCLUDED.failure_code,
                failure_reason = EXCLUDED.failure_reason
            "#,
        )
        .bind(transfer.id())
        .bind(transfer.source_account_id())
        .bind(transfer.target_account_id())
        .bind(transfer.amount().value())
        .bind(transfer.idempotency_key())
        .bind(transfer.status().as_str())
        .bind(transfer.failure_code())
        .bind(transfer.failure_reason())
        .bind(transfer.created_at())
        .execute(executor)
        .await
        .map_err(map_unique_violation(transfer.idempotency_key()))?;

        Ok(())
    }

    async fn insert_entry<'e, E>(
        executor: E,
        entry: &Transaction,
    ) -> Result<(), RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO account_transactions (id, account_id, type, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id())
        .bind(entry.account_id())
        .bind(entry.entry_type().as_str())
        .bind(entry.amount().value())
        .bind(entry.description())
        .bind(entry.created_at())
        .execute(executor)
        .await?;

        Ok(())
    }

    fn rehydrate_account(id: Uuid, row: AccountRow) -> Result<Account, RepositoryError> {
        let (customer_id, account_number, balance, status, version) = row;
        let status = AccountStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Storage(format!("unknown account status: {status}")))?;

        Ok(Account::from_stored(
            id,
            customer_id,
            account_number,
            Money::of(balance),
            status,
            version,
        ))
    }

    fn rehydrate_transfer(row: TransferRow) -> Result<Transfer, RepositoryError> {
        let (
            id,
            source_account_id,
            target_account_id,
            amount,
            idempotency_key,
            status,
            failure_code,
            failure_reason,
            created_at,
        ) = row;
        let status = TransferStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Storage(format!("unknown transfer status: {status}")))?;

        Ok(Transfer::from_stored(
            id,
            source_account_id,
            target_account_id,
            Money::of(amount),
            idempotency_key,
            status,
            failure_code,
            failure_reason,
            created_at,
        ))
    }

    fn rehydrate_entry(row: TransactionRow) -> Result<Transaction, RepositoryError> {
        let (id, account_id, entry_type, amount, description, created_at) = row;
        let entry_type = TransactionType::parse(&entry_type).ok_or_else(|| {
            RepositoryError::Storage(format!("unknown transaction type: {entry_type}"))
        })?;

        Ok(Transaction::from_stored(
            id,
            account_id,
            entry_type,
            Money::of(amount),
            description,
            created_at,
        ))
    }
}

/// Translate a unique-constraint violation into the idempotency error;
/// everything else passes through as a database error.
fn map_unique_violation(key: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            RepositoryError::DuplicateIdempotencyKey(key.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl AccountRepository for PgLedgerStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT customer_id, account_number, balance, status, version
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::rehydrate_account(id, r)).transpose()
    }

    async fn save(&self, account: &Account) -> Result<(), RepositoryError> {
        Self::upsert_account(&self.pool, account).await
    }
}

#[async_trait]
impl TransferRepository for PgLedgerStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, RepositoryError> {
        let row: Option<TransferRow> = sqlx::query_as(
            r#"
            SELECT id, source_account_id, target_account_id, amount,
                   idempotency_key, status, failure_code, failure_reason, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::rehydrate_transfer).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transfer>, RepositoryError> {
        let row: Option<TransferRow> = sqlx::query_as(
            r#"
            SELECT id, source_account_id, target_account_id, amount,
                   idempotency_key, status, failure_code, failure_reason, created_at
            FROM transfers
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::rehydrate_transfer).transpose()
    }

    async fn save(&self, transfer: &Transfer) -> Result<(), RepositoryError> {
        Self::upsert_transfer(&self.pool, transfer).await
    }
}

#[async_trait]
impl TransactionRepository for PgLedgerStore {
    async fn save(&self, entry: &Transaction) -> Result<(), RepositoryError> {
        Self::insert_entry(&self.pool, entry).await
    }

    async fn find_by_account_id(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, type, amount, description, created_at
            FROM account_transactions
            WHERE account_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::rehydrate_entry).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepositoryError> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, type, amount, description, created_at
            FROM account_transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::rehydrate_entry).transpose()
    }
}

#[async_trait]
impl UserRepository for PgLedgerStore {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, tax_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email())
        .bind(user.tax_id())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT name, email, tax_id FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, email, tax_id)| User::from_stored(id, name, email, tax_id)))
    }

    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<(Uuid, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, name, email, tax_id FROM users WHERE tax_id = $1
            "#,
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, email, tax_id)| User::from_stored(id, name, email, tax_id)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<(Uuid, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, name, email, tax_id FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, email, tax_id)| User::from_stored(id, name, email, tax_id)))
    }

    async fn exists_by_tax_id(&self, tax_id: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE tax_id = $1)
            "#,
        )
        .bind(tax_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl TransferUnitOfWork for PgLedgerStore {
    async fn commit_transfer(
        &self,
        source: &Account,
        target: &Account,
        transfer: &Transfer,
        entries: &[Transaction],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        Self::upsert_account(&mut *tx, source).await?;
        Self::upsert_account(&mut *tx, target).await?;
        Self::upsert_transfer(&mut *tx, transfer).await?;
        for entry in entries {
            Self::insert_entry(&mut *tx, entry).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

//! redb-based storage layer for orders, payments and reconciliations
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Orders with their line items |
//! | `kitchen_orders` | `order_id` | `()` | Index of confirmed/preparing orders |
//! | `payments` | `payment_id` | `Payment` (JSON) | Payments and refund records |
//! | `payment_txn_index` | `transaction_id` | `payment_id` | Lookup for verification callbacks |
//! | `order_payments` | `(order_id, payment_id)` | `()` | Payments of an order |
//! | `cashier_cash_payments` | `(cashier_id, created_at, payment_id)` | `()` | Shift reconciliation range scans |
//! | `reconciliations` | `reconciliation_id` | `CashReconciliation` (JSON) | Shift close records |
//! | `sequence_counter` | name | `u64` | Id counters |
//!
//! # Concurrency
//!
//! redb admits one write transaction at a time. Every read-validate-write
//! sequence runs inside a single [`WriteTransaction`], so two requests racing
//! on the same order are serialized: the second one observes the first one's
//! committed state and validates against it.
//!
//! # Durability
//!
//! Commits are persistent as soon as `commit()` returns (copy-on-write with an
//! atomic pointer swap), so a crash never leaves a half-written order.

mod orders;
mod payments;
mod reconciliations;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::AppError;

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Kitchen index: key = order_id, value = empty (existence check)
const KITCHEN_ORDERS_TABLE: TableDefinition<i64, ()> = TableDefinition::new("kitchen_orders");

/// Payments: key = payment_id, value = JSON-serialized Payment
const PAYMENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("payments");

/// Transaction id index: key = transaction_id, value = payment_id
const PAYMENT_TXN_INDEX: TableDefinition<&str, i64> = TableDefinition::new("payment_txn_index");

/// Order → payments: key = (order_id, payment_id), value = empty
const ORDER_PAYMENTS_TABLE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("order_payments");

/// Cash payments per cashier: key = (cashier_id, created_at, payment_id), value = empty
const CASHIER_PAYMENTS_TABLE: TableDefinition<(i64, i64, i64), ()> =
    TableDefinition::new("cashier_cash_payments");

/// Reconciliations: key = reconciliation_id, value = JSON-serialized CashReconciliation
const RECONCILIATIONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("reconciliations");

/// Id counters: key = counter name, value = last issued id
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

pub const ORDER_SEQ: &str = "order";
pub const PAYMENT_SEQ: &str = "payment";
pub const RECONCILIATION_SEQ: &str = "reconciliation";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dangling index entry: {0}")]
    DanglingIndex(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::database(err.to_string())
    }
}

/// Storage backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(KITCHEN_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_TXN_INDEX)?;
            let _ = write_txn.open_table(ORDER_PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(CASHIER_PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(RECONCILIATIONS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Cheap liveness probe for health checks
    pub fn ping(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(())
    }

    // ========== Sequence Operations ==========

    /// Issue the next id for `counter` (within transaction)
    pub fn next_id(&self, txn: &WriteTransaction, counter: &str) -> StorageResult<i64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(counter)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(counter, next)?;
        Ok(next as i64)
    }

    /// Last id issued for `counter` (read-only)
    pub fn current_id(&self, counter: &str) -> StorageResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table.get(counter)?.map(|guard| guard.value()).unwrap_or(0) as i64)
    }
}

//! redb-based persistence for orders, the revision ledger and payments
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Current order state (versioned) |
//! | `revisions` | `(order_id, version_to)` | `Revision` | Append-only ledger |
//! | `ledger_heads` | `order_id` | hash | Tail of each order's hash chain |
//! | `payments` | `payment_id` | `Payment` | Charge/refund records |
//! | `adjustments` | `adjustment_id` | `PaymentAdjustment` | Allocation audit |
//! | `idempotency` | `key` | `(order_id, version_to)` | Replay short-circuit |
//!
//! Every write belonging to one revision shares one `WriteTransaction`;
//! dropping the transaction without commit leaves nothing behind. redb
//! commits are durable as soon as `commit()` returns, which matters for
//! till hardware that gets powered off mid-shift.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::payment::{Payment, PaymentAdjustment};
use shared::revision::Revision;
use shared::order::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Current order state: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Ledger entries: key = (order_id, version_to), value = JSON-serialized Revision
const REVISIONS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("revisions");

/// Hash-chain tail per order: key = order_id, value = hex hash
const LEDGER_HEADS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("ledger_heads");

/// Payments: key = payment_id, value = JSON-serialized Payment
const PAYMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("payments");

/// Adjustments: key = adjustment_id, value = JSON-serialized PaymentAdjustment
const ADJUSTMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("adjustments");

/// Idempotency keys: key = client key, value = JSON (order_id, version_to)
const IDEMPOTENCY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("idempotency");

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
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::RevisionError {
    fn from(err: StorageError) -> Self {
        shared::RevisionError::Storage(err.to_string())
    }
}

/// Order/ledger/payment storage backed by redb
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(REVISIONS_TABLE)?;
            let _ = txn.open_table(LEDGER_HEADS_TABLE)?;
            let _ = txn.open_table(PAYMENTS_TABLE)?;
            let _ = txn.open_table(ADJUSTMENTS_TABLE)?;
            let _ = txn.open_table(IDEMPOTENCY_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Get an order (read-only snapshot)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order within a write transaction (for the version check)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Store an order
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Revision Ledger ==========

    /// Append a ledger entry
    pub fn store_revision(&self, txn: &WriteTransaction, revision: &Revision) -> StorageResult<()> {
        let mut table = txn.open_table(REVISIONS_TABLE)?;
        let key = (revision.order_id.as_str(), revision.version_to);
        let value = serde_json::to_vec(revision)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All ledger entries for an order, in version order
    pub fn get_revisions_for_order(&self, order_id: &str) -> StorageResult<Vec<Revision>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REVISIONS_TABLE)?;

        let mut revisions = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let revision: Revision = serde_json::from_slice(value.value())?;
            revisions.push(revision);
        }
        revisions.sort_by_key(|r| r.version_to);
        Ok(revisions)
    }

    /// One ledger entry by (order, resulting version)
    pub fn get_revision(
        &self,
        order_id: &str,
        version_to: u64,
    ) -> StorageResult<Option<Revision>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REVISIONS_TABLE)?;
        match table.get((order_id, version_to))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Hash-chain tail for an order, within the write transaction
    pub fn ledger_head_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(LEDGER_HEADS_TABLE)?;
        Ok(table.get(order_id)?.map(|guard| guard.value().to_string()))
    }

    /// Advance an order's hash-chain tail
    pub fn set_ledger_head(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        hash: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LEDGER_HEADS_TABLE)?;
        table.insert(order_id, hash)?;
        Ok(())
    }

    // ========== Payment Operations ==========

    /// Store (insert or overwrite) a payment
    pub fn store_payment(&self, txn: &WriteTransaction, payment: &Payment) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(payment)?;
        table.insert(payment.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a payment by id
    pub fn get_payment(&self, payment_id: &str) -> StorageResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a payment by id within a write transaction
    pub fn get_payment_txn(
        &self,
        txn: &WriteTransaction,
        payment_id: &str,
    ) -> StorageResult<Option<Payment>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All payments for an order, in creation order
    pub fn get_payments_for_order(&self, order_id: &str) -> StorageResult<Vec<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        let mut payments = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let payment: Payment = serde_json::from_slice(value.value())?;
            if payment.order_id == order_id {
                payments.push(payment);
            }
        }
        payments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(payments)
    }

    /// All payments for an order within a write transaction
    pub fn get_payments_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<Payment>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        let mut payments = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let payment: Payment = serde_json::from_slice(value.value())?;
            if payment.order_id == order_id {
                payments.push(payment);
            }
        }
        payments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(payments)
    }

    // ========== Adjustment Operations ==========

    /// Store (insert or overwrite) an adjustment
    pub fn store_adjustment(
        &self,
        txn: &WriteTransaction,
        adjustment: &PaymentAdjustment,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ADJUSTMENTS_TABLE)?;
        let value = serde_json::to_vec(adjustment)?;
        table.insert(adjustment.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an adjustment by id
    pub fn get_adjustment(&self, adjustment_id: &str) -> StorageResult<Option<PaymentAdjustment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ADJUSTMENTS_TABLE)?;
        match table.get(adjustment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an adjustment by id within a write transaction
    pub fn get_adjustment_txn(
        &self,
        txn: &WriteTransaction,
        adjustment_id: &str,
    ) -> StorageResult<Option<PaymentAdjustment>> {
        let table = txn.open_table(ADJUSTMENTS_TABLE)?;
        match table.get(adjustment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All adjustments for an order, in creation order
    pub fn get_adjustments_for_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Vec<PaymentAdjustment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ADJUSTMENTS_TABLE)?;
        let mut adjustments = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let adjustment: PaymentAdjustment = serde_json::from_slice(value.value())?;
            if adjustment.order_id == order_id {
                adjustments.push(adjustment);
            }
        }
        adjustments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(adjustments)
    }

    /// Adjustments pending on a given payment (for settle mirroring)
    pub fn get_adjustments_for_payment_txn(
        &self,
        txn: &WriteTransaction,
        payment_id: &str,
    ) -> StorageResult<Vec<PaymentAdjustment>> {
        let table = txn.open_table(ADJUSTMENTS_TABLE)?;
        let mut adjustments = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let adjustment: PaymentAdjustment = serde_json::from_slice(value.value())?;
            if adjustment.payment_id == payment_id {
                adjustments.push(adjustment);
            }
        }
        Ok(adjustments)
    }

    // ========== Idempotency ==========

    /// Look up a previously committed revision by idempotency key
    pub fn lookup_idempotency(&self, key: &str) -> StorageResult<Option<(String, u64)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDEMPOTENCY_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Same lookup within a write transaction (double-check before commit)
    pub fn lookup_idempotency_txn(
        &self,
        txn: &WriteTransaction,
        key: &str,
    ) -> StorageResult<Option<(String, u64)>> {
        let table = txn.open_table(IDEMPOTENCY_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Record an idempotency key for a committed revision
    pub fn mark_idempotent(
        &self,
        txn: &WriteTransaction,
        key: &str,
        order_id: &str,
        version_to: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(IDEMPOTENCY_TABLE)?;
        let value = serde_json::to_vec(&(order_id, version_to))?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }
}

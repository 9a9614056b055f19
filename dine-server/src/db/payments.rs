use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::{Payment, PaymentMethod};

use super::{
    CASHIER_PAYMENTS_TABLE, ORDER_PAYMENTS_TABLE, PAYMENT_TXN_INDEX, PAYMENTS_TABLE, Storage,
    StorageError, StorageResult,
};

fn decode_payment<T: ReadableTable<i64, &'static [u8]>>(
    table: &T,
    payment_id: i64,
) -> StorageResult<Payment> {
    let guard = table
        .get(payment_id)?
        .ok_or_else(|| StorageError::DanglingIndex(format!("payment {payment_id}")))?;
    Ok(serde_json::from_slice(guard.value())?)
}

impl Storage {
    // ========== Payment Operations ==========

    /// Insert or replace a payment (within transaction)
    ///
    /// Maintains the transaction-id, per-order and per-cashier indexes.
    pub fn put_payment(&self, txn: &WriteTransaction, payment: &Payment) -> StorageResult<()> {
        {
            let mut table = txn.open_table(PAYMENTS_TABLE)?;
            let value = serde_json::to_vec(payment)?;
            table.insert(payment.id, value.as_slice())?;
        }
        {
            let mut index = txn.open_table(PAYMENT_TXN_INDEX)?;
            index.insert(payment.transaction_id.as_str(), payment.id)?;
        }
        {
            let mut index = txn.open_table(ORDER_PAYMENTS_TABLE)?;
            index.insert((payment.order_id, payment.id), ())?;
        }
        if payment.method == PaymentMethod::Cash
            && let Some(cashier_id) = payment.processed_by
        {
            let mut index = txn.open_table(CASHIER_PAYMENTS_TABLE)?;
            index.insert((cashier_id, payment.created_at, payment.id), ())?;
        }
        Ok(())
    }

    /// Get a payment by id (within transaction)
    pub fn get_payment_txn(
        &self,
        txn: &WriteTransaction,
        payment_id: i64,
    ) -> StorageResult<Option<Payment>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a payment by id
    pub fn get_payment(&self, payment_id: i64) -> StorageResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Check whether a transaction id is already taken (within transaction)
    pub fn transaction_exists_txn(&self, txn: &WriteTransaction, transaction_id: &str) -> StorageResult<bool> {
        let index = txn.open_table(PAYMENT_TXN_INDEX)?;
        Ok(index.get(transaction_id)?.is_some())
    }

    /// Find a payment by its transaction id (within transaction)
    pub fn find_payment_by_txn_txn(
        &self,
        txn: &WriteTransaction,
        transaction_id: &str,
    ) -> StorageResult<Option<Payment>> {
        let payment_id = {
            let index = txn.open_table(PAYMENT_TXN_INDEX)?;
            match index.get(transaction_id)? {
                Some(guard) => guard.value(),
                None => return Ok(None),
            }
        };
        self.get_payment_txn(txn, payment_id)
    }

    /// Find a payment by its transaction id
    pub fn find_payment_by_txn(&self, transaction_id: &str) -> StorageResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PAYMENT_TXN_INDEX)?;
        let Some(payment_id) = index.get(transaction_id)?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        decode_payment(&table, payment_id).map(Some)
    }

    /// All payments of an order, oldest first (within transaction)
    pub fn payments_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
    ) -> StorageResult<Vec<Payment>> {
        let index = txn.open_table(ORDER_PAYMENTS_TABLE)?;
        let table = txn.open_table(PAYMENTS_TABLE)?;

        let mut payments = Vec::new();
        for result in index.range((order_id, i64::MIN)..=(order_id, i64::MAX))? {
            let (key, _value) = result?;
            let (_, payment_id) = key.value();
            payments.push(decode_payment(&table, payment_id)?);
        }
        Ok(payments)
    }

    /// All payments of an order, oldest first
    pub fn payments_for_order(&self, order_id: i64) -> StorageResult<Vec<Payment>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_PAYMENTS_TABLE)?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;

        let mut payments = Vec::new();
        for result in index.range((order_id, i64::MIN)..=(order_id, i64::MAX))? {
            let (key, _value) = result?;
            let (_, payment_id) = key.value();
            payments.push(decode_payment(&table, payment_id)?);
        }
        Ok(payments)
    }

    /// Cash payments recorded by `cashier_id` with `created_at` in `[start, end]`
    ///
    /// Refund records are included; callers filter on amount.
    pub fn cash_payments_for_cashier(
        &self,
        cashier_id: i64,
        start: i64,
        end: i64,
    ) -> StorageResult<Vec<Payment>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CASHIER_PAYMENTS_TABLE)?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;

        let mut payments = Vec::new();
        let range = (cashier_id, start, i64::MIN)..=(cashier_id, end, i64::MAX);
        for result in index.range(range)? {
            let (key, _value) = result?;
            let (_, _, payment_id) = key.value();
            payments.push(decode_payment(&table, payment_id)?);
        }
        Ok(payments)
    }
}

use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::Order;

use super::{KITCHEN_ORDERS_TABLE, ORDERS_TABLE, Storage, StorageError, StorageResult};

impl Storage {
    // ========== Order Operations ==========

    /// Insert or replace an order (within transaction)
    ///
    /// Keeps the kitchen index in step: an order is indexed exactly while it
    /// is confirmed/preparing and not soft-deleted.
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id, value.as_slice())?;
        }

        let mut kitchen = txn.open_table(KITCHEN_ORDERS_TABLE)?;
        if order.status.is_kitchen_active() && !order.is_deleted() {
            kitchen.insert(order.id, ())?;
        } else {
            kitchen.remove(order.id)?;
        }
        Ok(())
    }

    /// Get an order by id (within transaction), soft-deleted included
    pub fn get_order_txn(&self, txn: &WriteTransaction, order_id: i64) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id, soft-deleted included
    pub fn get_order(&self, order_id: i64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All orders, soft-deleted included, in id order
    pub fn list_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    /// Orders currently on the kitchen display, oldest first
    ///
    /// Reads the index and the order rows from the same snapshot.
    pub fn kitchen_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(KITCHEN_ORDERS_TABLE)?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<Order> = Vec::new();
        for result in index.iter()? {
            let (key, _value) = result?;
            let order_id = key.value();
            let guard = table.get(order_id)?.ok_or_else(|| {
                StorageError::DanglingIndex(format!("kitchen_orders -> order {order_id}"))
            })?;
            orders.push(serde_json::from_slice(guard.value())?);
        }

        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }
}

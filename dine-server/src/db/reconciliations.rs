use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::CashReconciliation;

use super::{RECONCILIATIONS_TABLE, Storage, StorageResult};

impl Storage {
    // ========== Reconciliation Operations ==========

    /// Insert a reconciliation record (within transaction)
    pub fn put_reconciliation(
        &self,
        txn: &WriteTransaction,
        record: &CashReconciliation,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(RECONCILIATIONS_TABLE)?;
        let value = serde_json::to_vec(record)?;
        table.insert(record.id, value.as_slice())?;
        Ok(())
    }

    /// Reconciliations, newest first, optionally for a single cashier
    pub fn list_reconciliations(
        &self,
        cashier_id: Option<i64>,
    ) -> StorageResult<Vec<CashReconciliation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECONCILIATIONS_TABLE)?;

        let mut records = Vec::new();
        for result in table.iter()?.rev() {
            let (_key, value) = result?;
            let record: CashReconciliation = serde_json::from_slice(value.value())?;
            if cashier_id.is_none_or(|id| id == record.cashier_id) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

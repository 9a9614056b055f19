use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;

use super::{CatalogEntry, CatalogError, CatalogLookup};
use crate::core::error::ServerError;

/// 内存菜单目录
///
/// 读多写少，使用 `parking_lot::RwLock`。
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<HashMap<i64, CatalogEntry>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let catalog = Self::new();
        for entry in entries {
            catalog.upsert(entry);
        }
        catalog
    }

    /// Load a JSON array of entries
    ///
    /// ```json
    /// [{ "id": 1, "name": "Spring Rolls", "price": "8.99", "available": true }]
    /// ```
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw).map_err(|e| {
            ServerError::Catalog(format!("invalid seed file {}: {}", path.display(), e))
        })?;
        for entry in &entries {
            entry
                .check_price()
                .map_err(|e| ServerError::Catalog(format!("invalid seed file {}: {}", path.display(), e)))?;
        }
        tracing::info!(path = %path.display(), count = entries.len(), "Menu catalog seeded");
        Ok(Self::with_entries(entries))
    }

    pub fn upsert(&self, entry: CatalogEntry) {
        self.items.write().insert(entry.id, entry);
    }

    /// 改价 (不影响已下单的订单行)
    pub fn set_price(&self, id: i64, price: Decimal) -> bool {
        match self.items.write().get_mut(&id) {
            Some(entry) => {
                entry.price = price;
                true
            }
            None => false,
        }
    }

    pub fn set_available(&self, id: i64, available: bool) -> bool {
        match self.items.write().get_mut(&id) {
            Some(entry) => {
                entry.available = available;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl CatalogLookup for MemoryCatalog {
    async fn lookup(&self, ids: &[i64]) -> Result<HashMap<i64, CatalogEntry>, CatalogError> {
        let items = self.items.read();
        let mut found = HashMap::with_capacity(ids.len());
        for entry in ids.iter().filter_map(|id| items.get(id)) {
            entry.check_price()?;
            found.insert(entry.id, entry.clone());
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(id: i64, cents: i64) -> CatalogEntry {
        CatalogEntry {
            id,
            name: format!("Item {id}"),
            price: Decimal::new(cents, 2),
            available: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_skips_unknown_ids() {
        let catalog = MemoryCatalog::with_entries([entry(1, 1000), entry(2, 500)]);
        let found = catalog.lookup(&[1, 3]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&1].price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn test_price_and_availability_updates() {
        let catalog = MemoryCatalog::with_entries([entry(1, 1000)]);
        assert!(catalog.set_price(1, Decimal::new(1200, 2)));
        assert!(catalog.set_available(1, false));
        assert!(!catalog.set_price(9, Decimal::ONE));

        let found = catalog.lookup(&[1]).await.unwrap();
        assert_eq!(found[&1].price, Decimal::new(1200, 2));
        assert!(!found[&1].available);
    }

    #[test]
    fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":1,"name":"Spring Rolls","price":"8.99"}},{{"id":2,"name":"Wings","price":12.99,"available":false}}]"#
        )
        .unwrap();

        let catalog = MemoryCatalog::from_seed_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        let items = catalog.items.read();
        assert!(items[&1].available);
        assert_eq!(items[&2].price, Decimal::new(1299, 2));
    }

    #[tokio::test]
    async fn test_negative_price_is_malformed() {
        let catalog = MemoryCatalog::with_entries([entry(1, 1000)]);
        assert!(catalog.set_price(1, Decimal::new(-100, 2)));
        assert!(matches!(
            catalog.lookup(&[1]).await,
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn test_negative_price_in_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id":1,"name":"Spring Rolls","price":"-8.99"}}]"#).unwrap();
        assert!(matches!(
            MemoryCatalog::from_seed_file(file.path()),
            Err(ServerError::Catalog(_))
        ));
    }

    #[test]
    fn test_bad_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            MemoryCatalog::from_seed_file(file.path()),
            Err(ServerError::Catalog(_))
        ));
    }
}

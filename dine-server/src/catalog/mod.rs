//! 菜单目录查询
//!
//! 订单创建和改单时，通过 [`CatalogLookup`] 一次性批量查询菜品的
//! 当前价格和可售状态。价格在下单时冻结到订单行上。
//!
//! - [`MemoryCatalog`] - 内存目录 (测试、单机部署、种子文件)
//! - [`HttpCatalog`] - 远程菜单服务

mod http;
mod memory;

pub use http::HttpCatalog;
pub use memory::MemoryCatalog;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::Config;
use crate::core::error::ServerError;
use crate::utils::{AppError, ErrorCode};

/// One menu item as the catalog sees it right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl CatalogEntry {
    /// Reject entries that would break order amounts
    pub fn check_price(&self) -> Result<(), CatalogError> {
        if self.price < Decimal::ZERO {
            return Err(CatalogError::Malformed(format!(
                "menu item {} has negative price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog returned malformed data: {0}")]
    Malformed(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::with_message(ErrorCode::CatalogUnavailable, err.to_string())
    }
}

/// Batch price/availability lookup
///
/// Ids missing from the returned map are unknown to the catalog.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn lookup(&self, ids: &[i64]) -> Result<HashMap<i64, CatalogEntry>, CatalogError>;
}

/// 根据配置选择目录实现
///
/// 设置了 `CATALOG_URL` 时使用远程服务，否则使用内存目录 (可选种子文件)。
pub fn from_config(config: &Config) -> Result<Arc<dyn CatalogLookup>, ServerError> {
    if let Some(url) = &config.catalog.url {
        tracing::info!(url = %url, "Using remote menu catalog");
        let catalog = HttpCatalog::new(url.clone(), config.catalog.timeout_ms)
            .map_err(|e| ServerError::Catalog(e.to_string()))?;
        return Ok(Arc::new(catalog));
    }

    let catalog = match &config.catalog.seed_file {
        Some(path) => MemoryCatalog::from_seed_file(path)?,
        None => {
            tracing::warn!("No CATALOG_URL or CATALOG_SEED_FILE set, menu catalog is empty");
            MemoryCatalog::new()
        }
    };
    Ok(Arc::new(catalog))
}

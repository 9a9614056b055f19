use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{self, CatalogLookup};
use crate::core::{Config, Result};
use crate::db::Storage;
use crate::kitchen::KitchenNotifier;
use crate::orders::OrderService;
use crate::payments::PaymentService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有字段都是 `Arc` 包装或可廉价克隆的句柄，按值传入每个 handler。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | storage | redb 存储 |
/// | orders | 订单聚合 |
/// | payments | 支付处理 |
/// | kitchen | 厨房显示广播 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub kitchen: KitchenNotifier,
    started_at: Instant,
}

impl ServerState {
    /// 由已打开的存储和目录组装服务
    ///
    /// 集成测试用它注入临时数据库和内存目录。
    pub fn new(config: Config, storage: Storage, catalog: Arc<dyn CatalogLookup>) -> Self {
        let kitchen = KitchenNotifier::new(storage.clone(), config.kitchen_queue_capacity);
        let orders = OrderService::new(storage.clone(), catalog, kitchen.clone());
        let payments = PaymentService::new(storage.clone(), orders.clone(), config.qris.clone());
        Self {
            config,
            storage,
            orders,
            payments,
            kitchen,
            started_at: Instant::now(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录和日志目录
    /// 2. 打开 redb 数据库
    /// 3. 按配置选择菜单目录
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        std::fs::create_dir_all(config.log_dir())?;

        let db_path = config.database_path();
        let storage = Storage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        let catalog = catalog::from_config(config)?;
        Ok(Self::new(config.clone(), storage, catalog))
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

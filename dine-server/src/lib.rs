//! Dine Server - 餐厅订单生命周期、支付对账与厨房推送
//!
//! # 模块结构
//!
//! ```text
//! dine-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── auth/          # 网关身份头、角色检查
//! ├── db/            # redb 存储
//! ├── catalog/       # 菜单价格查询
//! ├── orders/        # 订单聚合
//! ├── payments/      # 支付处理
//! ├── kitchen/       # 厨房显示广播
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod db;
pub mod kitchen;
pub mod orders;
pub mod payments;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export 公共类型
pub use auth::{CurrentUser, Role};
pub use core::{Config, Server, ServerState};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境
///
/// 1. 加载 `.env` (不存在时忽略)
/// 2. 创建工作目录和日志目录
/// 3. 初始化日志
pub fn setup_environment() -> Result<Config, std::io::Error> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    std::fs::create_dir_all(config.log_dir())?;

    let log_dir = config.log_dir();
    let log_dir = config.is_production().then(|| log_dir.to_string_lossy().into_owned());
    init_logger_with_file(Some(&config.log_level), config.log_json, log_dir.as_deref());

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  _
   / __ \(_)___  ___
  / / / / / __ \/ _ \
 / /_/ / / / / /  __/
/_____/_/_/ /_/\___/
    "#
    );
}

use std::path::PathBuf;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 8002 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | QRIS_MERCHANT_ID | RECURSIVE_DINE | QR 支付商户号 |
/// | QRIS_CALLBACK_URL | http://localhost:8002/api/payments/webhook | 支付回调地址 |
/// | QRIS_EXPIRY_MINUTES | 15 | 二维码有效期 (分钟) |
/// | KITCHEN_QUEUE_CAPACITY | 256 | 厨房广播队列容量 |
/// | CATALOG_URL | - | 菜单服务地址 (未设置时使用内存菜单) |
/// | CATALOG_SEED_FILE | - | 内存菜单种子文件 (JSON) |
/// | CATALOG_TIMEOUT_MS | 3000 | 菜单查询超时(毫秒) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/dine HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// QR 支付配置
    pub qris: QrisConfig,
    /// 厨房广播有界队列容量
    pub kitchen_queue_capacity: usize,
    /// 菜单查询配置
    pub catalog: CatalogConfig,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
}

/// Digital payment provider settings
#[derive(Debug, Clone)]
pub struct QrisConfig {
    pub merchant_id: String,
    pub callback_url: String,
    pub expiry_minutes: i64,
}

impl Default for QrisConfig {
    fn default() -> Self {
        Self {
            merchant_id: "RECURSIVE_DINE".into(),
            callback_url: "http://localhost:8002/api/payments/webhook".into(),
            expiry_minutes: 15,
        }
    }
}

/// Menu catalog source
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Remote menu service base URL
    pub url: Option<String>,
    /// Seed file for the in-memory catalog
    pub seed_file: Option<String>,
    pub timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let qris_defaults = QrisConfig::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 8002),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            qris: QrisConfig {
                merchant_id: env_opt("QRIS_MERCHANT_ID").unwrap_or(qris_defaults.merchant_id),
                callback_url: env_opt("QRIS_CALLBACK_URL").unwrap_or(qris_defaults.callback_url),
                expiry_minutes: env_or("QRIS_EXPIRY_MINUTES", qris_defaults.expiry_minutes),
            },
            kitchen_queue_capacity: env_or("KITCHEN_QUEUE_CAPACITY", 256usize).max(1),
            catalog: CatalogConfig {
                url: env_opt("CATALOG_URL"),
                seed_file: env_opt("CATALOG_SEED_FILE"),
                timeout_ms: env_or("CATALOG_TIMEOUT_MS", 3000),
            },
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("dine.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_paths() {
        let config = Config::with_overrides("/tmp/dine-test", 9100);
        assert_eq!(config.http_port, 9100);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/dine-test/dine.redb")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/dine-test/logs"));
        assert!(config.kitchen_queue_capacity >= 1);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("DINE_TEST_UNSET_VARIABLE", 42u16), 42);
    }
}

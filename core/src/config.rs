//! 连接池配置

use serde::Deserialize;
use sqlx::pool::PoolOptions;
use sqlx::Database;
use std::time::Duration;

pub const ENV_MAX_CONNECTIONS: &str = "SQLXRECORD_MAX_CONNECTIONS";
pub const ENV_MIN_CONNECTIONS: &str = "SQLXRECORD_MIN_CONNECTIONS";
pub const ENV_ACQUIRE_TIMEOUT_SECS: &str = "SQLXRECORD_ACQUIRE_TIMEOUT_SECS";

/// 连接池配置
///
/// 所有字段都有默认值，可以从配置文件里只写需要覆盖的部分：
///
/// ```ignore
/// let config: PoolConfig = serde_json::from_str(r#"{ "max_connections": 4 }"#)?;
/// let db = SqliteDbo::open_with("app.db", &config).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// `None` 表示空闲连接不过期
    pub idle_timeout_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: Some(600),
        }
    }
}

impl PoolConfig {
    /// 从环境变量读取，未设置或无法解析的项使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_u32 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u32>().ok());

        Self {
            max_connections: parse_u32(ENV_MAX_CONNECTIONS)
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            min_connections: parse_u32(ENV_MIN_CONNECTIONS).unwrap_or(defaults.min_connections),
            acquire_timeout_secs: lookup(ENV_ACQUIRE_TIMEOUT_SECS)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(defaults.acquire_timeout_secs),
            idle_timeout_secs: defaults.idle_timeout_secs,
        }
    }

    /// 转换为 sqlx 的 `PoolOptions`
    pub fn pool_options<DB: Database>(&self) -> PoolOptions<DB> {
        // 最大连接数至少为 1，最小连接数不能超过最大连接数
        let max = self.max_connections.max(1);
        PoolOptions::<DB>::new()
            .max_connections(max)
            .min_connections(self.min_connections.min(max))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(self.idle_timeout_secs.map(Duration::from_secs))
    }
}

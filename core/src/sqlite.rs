//! SQLite 连接

use crate::config::PoolConfig;
use crate::dbo::Dbo;
use crate::error::{Result, SqlxRecordError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub type SqliteDbo = Dbo<sqlx::Sqlite>;

/// 内存数据库的路径
pub const MEMORY: &str = ":memory:";

impl Dbo<sqlx::Sqlite> {
    /// 使用默认连接池配置打开 SQLite 数据库文件
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &PoolConfig::default()).await
    }

    /// 打开 SQLite 数据库文件
    ///
    /// 文件必须已经存在，不会自动创建。`":memory:"` 打开一个内存数据库，
    /// 此时连接池固定只保留一个常驻连接，所有语句看到的是同一个库，
    /// `config` 中只有 `acquire_timeout_secs` 生效。
    pub async fn open_with(path: impl AsRef<Path>, config: &PoolConfig) -> Result<Self> {
        let path = path.as_ref();
        let dsn = path.display().to_string();

        if dsn == MEMORY {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| SqlxRecordError::connect(&dsn, e))?;
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
                .idle_timeout(None)
                .max_lifetime(None);
            return Self::open_checked(options, pool_options, &dsn).await;
        }

        std::fs::metadata(path).map_err(|e| SqlxRecordError::connect(&dsn, sqlx::Error::Io(e)))?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        Self::open_checked(options, config.pool_options::<sqlx::Sqlite>(), &dsn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let err = SqliteDbo::open(&path).await.unwrap_err();
        match &err {
            SqlxRecordError::Connect {
                source: sqlx::Error::Io(io),
                ..
            } => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().ends_with(&format!("({})", path.display())));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_open_memory() {
        let db = SqliteDbo::open(MEMORY).await.unwrap();
        db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        assert_eq!(
            db.execute("INSERT INTO t (name) VALUES ('a'), ('b')")
                .await
                .unwrap(),
            2
        );
        assert_eq!(db.pool().options().get_max_connections(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_open_memory_applies_acquire_timeout() {
        let config = PoolConfig {
            max_connections: 8,
            acquire_timeout_secs: 3,
            ..PoolConfig::default()
        };
        let db = SqliteDbo::open_with(MEMORY, &config).await.unwrap();
        let options = db.pool().options();
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
        // 内存库的连接数固定为 1
        assert_eq!(options.get_max_connections(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_open_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let db = SqliteDbo::open(file.path()).await.unwrap();
        assert_eq!(db.execute("CREATE TABLE t (id INTEGER)").await.unwrap(), 0);
        db.close().await;
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlxRecordError {
    /// 打开连接或 ping 失败，附带原始错误和 DSN 方便排查
    #[error("{source} ({dsn})")]
    Connect {
        dsn: String,
        #[source]
        source: sqlx::Error,
    },
    /// 单行查询没有返回任何记录
    #[error("no rows in result set")]
    NotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),
    /// Record 描述信息不合法（手写 `Record` 实现时才可能出现）
    #[error("Invalid record `{record}`: {reason}")]
    InvalidRecord {
        record: &'static str,
        reason: String,
    },
}

impl SqlxRecordError {
    pub(crate) fn connect(dsn: impl Into<String>, source: sqlx::Error) -> Self {
        SqlxRecordError::Connect {
            dsn: dsn.into(),
            source,
        }
    }

    /// 是否为 "没有记录" 错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, SqlxRecordError::NotFound)
    }
}

impl From<sqlx::Error> for SqlxRecordError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SqlxRecordError::NotFound,
            other => SqlxRecordError::DatabaseError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SqlxRecordError>;

// derive 生成的代码以 `::sqlxrecord::` 引用本 crate，crate 内部的测试也需要能解析
extern crate self as sqlxrecord;

pub mod backend;
pub mod bind;
pub mod config;
pub mod crud;
pub mod dbo;
pub mod error;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod record;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod statement;
pub mod transaction;

pub use backend::{Backend, DbDriver};
pub use bind::BindValue;
pub use config::PoolConfig;
pub use dbo::Dbo;
#[cfg(feature = "mysql")]
pub use mysql::MySqlDbo;
pub use record::{FieldMeta, Id, Record, EMPTY_SKIP_LIST};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDbo;
pub use statement::Statement;
pub use transaction::Tx;

// 重新导出 sqlx，derive 生成的 FromRow 实现通过它引用 sqlx
pub use sqlx;

// 重新导出 derive 的所有公共 API（宏）
pub use error::{Result, SqlxRecordError};
pub use sqlxrecord_derive::*;

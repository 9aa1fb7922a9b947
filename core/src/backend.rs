//! 数据库后端抽象层
//!
//! 提供统一的接口来访问不同数据库的特性，如占位符、标识符转义、
//! 自增主键的获取以及绑定值的应用。

use crate::bind::BindValue;
use sqlx::error::BoxDynError;
use sqlx::query::{Query, QueryAs};
use sqlx::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    MySql,
    Sqlite,
}

impl DbDriver {
    pub fn name(&self) -> &'static str {
        match self {
            DbDriver::MySql => "mysql",
            DbDriver::Sqlite => "sqlite",
        }
    }
}

/// 数据库后端 trait
///
/// 为不同的数据库类型提供统一的接口。每个支持的 `sqlx::Database`
/// （`sqlx::MySql`, `sqlx::Sqlite`）都实现此 trait，CRUD 代码只依赖这里的方法，
/// 不需要在泛型上下文中罗列每种绑定类型的 `Encode`/`Type` 约束。
pub trait Backend: Database {
    /// 获取数据库驱动类型
    fn get_driver() -> DbDriver;

    /// 获取占位符字符串
    ///
    /// * MySQL/SQLite: `"?"`
    fn placeholder(index: usize) -> String;

    /// 转义 SQL 标识符（表名、列名等）
    ///
    /// * MySQL: `` `name` ``
    /// * SQLite: `"name"`
    fn escape_identifier(name: &str) -> String;

    /// 从 INSERT 的执行结果中取出新生成的主键
    fn last_insert_id(result: &Self::QueryResult) -> i64;

    /// 受影响的行数
    fn rows_affected(result: &Self::QueryResult) -> u64;

    /// 检查绑定值能否无损地写入该数据库，默认全部接受
    ///
    /// CRUD 在应用绑定值之前调用，不能表示的值直接报错，不会被截断或回绕。
    fn check_bind_value(_value: &BindValue) -> std::result::Result<(), BoxDynError> {
        Ok(())
    }

    /// 将单个绑定值应用到 `sqlx::query` 上
    fn bind_value<'q>(
        query: Query<'q, Self, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> Query<'q, Self, <Self as Database>::Arguments<'q>>;

    /// 将单个绑定值应用到 `sqlx::query_as` 上
    fn bind_value_as<'q, O>(
        query: QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>>;
}

/// 把 [`BindValue`] 展开成具体类型后调用 `bind`
///
/// `u64` 的处理因数据库而异，由调用方给出。
macro_rules! apply_bind_value {
    ($query:expr, $value:expr, u64 => |$u:ident| $u64_bind:expr) => {
        match $value {
            BindValue::String(s) => $query.bind(s),
            BindValue::Int64(i) => $query.bind(i),
            BindValue::Int32(i) => $query.bind(i),
            BindValue::Int16(i) => $query.bind(i),
            BindValue::Int8(i) => $query.bind(i16::from(i)),
            BindValue::UInt64($u) => $query.bind($u64_bind),
            BindValue::UInt32(i) => $query.bind(i64::from(i)),
            BindValue::UInt16(i) => $query.bind(i32::from(i)),
            BindValue::UInt8(i) => $query.bind(i16::from(i)),
            BindValue::Float64(f) => $query.bind(f),
            BindValue::Float32(f) => $query.bind(f),
            BindValue::Bool(b) => $query.bind(b),
            BindValue::Bytes(b) => $query.bind(b),
            BindValue::DateTime(t) => $query.bind(t),
            BindValue::NaiveDateTime(t) => $query.bind(t),
            BindValue::NaiveDate(d) => $query.bind(d),
            BindValue::Null => $query.bind(Option::<String>::None),
        }
    };
}

// ========== MySQL 实现 ==========

#[cfg(feature = "mysql")]
impl Backend for sqlx::MySql {
    fn get_driver() -> DbDriver {
        DbDriver::MySql
    }

    fn placeholder(_index: usize) -> String {
        "?".to_string()
    }

    fn escape_identifier(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn last_insert_id(result: &sqlx::mysql::MySqlQueryResult) -> i64 {
        result.last_insert_id() as i64
    }

    fn rows_affected(result: &sqlx::mysql::MySqlQueryResult) -> u64 {
        result.rows_affected()
    }

    fn bind_value<'q>(
        query: Query<'q, Self, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> Query<'q, Self, <Self as Database>::Arguments<'q>> {
        // MySQL 原生支持 BIGINT UNSIGNED
        apply_bind_value!(query, value, u64 => |u| u)
    }

    fn bind_value_as<'q, O>(
        query: QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>> {
        apply_bind_value!(query, value, u64 => |u| u)
    }
}

// ========== SQLite 实现 ==========

#[cfg(feature = "sqlite")]
impl Backend for sqlx::Sqlite {
    fn get_driver() -> DbDriver {
        DbDriver::Sqlite
    }

    fn placeholder(_index: usize) -> String {
        "?".to_string()
    }

    fn escape_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn last_insert_id(result: &sqlx::sqlite::SqliteQueryResult) -> i64 {
        result.last_insert_rowid()
    }

    fn rows_affected(result: &sqlx::sqlite::SqliteQueryResult) -> u64 {
        result.rows_affected()
    }

    fn check_bind_value(value: &BindValue) -> std::result::Result<(), BoxDynError> {
        // SQLite 的 INTEGER 是有符号 64 位
        match value {
            BindValue::UInt64(u) if i64::try_from(*u).is_err() => {
                Err(format!("u64 value {u} is out of range for a SQLite INTEGER").into())
            }
            _ => Ok(()),
        }
    }

    fn bind_value<'q>(
        query: Query<'q, Self, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> Query<'q, Self, <Self as Database>::Arguments<'q>> {
        // 超出 i64 的值已被 check_bind_value 拒绝
        apply_bind_value!(query, value, u64 => |u| u as i64)
    }

    fn bind_value_as<'q, O>(
        query: QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>>,
        value: BindValue,
    ) -> QueryAs<'q, Self, O, <Self as Database>::Arguments<'q>> {
        apply_bind_value!(query, value, u64 => |u| u as i64)
    }
}

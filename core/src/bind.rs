//! 绑定值
//!
//! Record 字段和 WHERE 参数在执行前统一转换为 [`BindValue`]，
//! 再由各数据库的 [`Backend`](crate::backend::Backend) 实现绑定到 sqlx 查询上。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// 绑定值，用于安全地传递参数
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    String(String),
    Int64(i64),
    Int32(i32),
    Int16(i16),
    Int8(i8),
    UInt64(u64),
    UInt32(u32),
    UInt16(u16),
    UInt8(u8),
    Float64(f64),
    Float32(f32),
    Bool(bool),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    NaiveDateTime(NaiveDateTime),
    NaiveDate(NaiveDate),
    Null,
}

macro_rules! impl_from_for_bind_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for BindValue {
                fn from(value: $ty) -> Self {
                    BindValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_bind_value!(
    String => String,
    i64 => Int64,
    i32 => Int32,
    i16 => Int16,
    i8 => Int8,
    u64 => UInt64,
    u32 => UInt32,
    u16 => UInt16,
    u8 => UInt8,
    f64 => Float64,
    f32 => Float32,
    bool => Bool,
    Vec<u8> => Bytes,
    DateTime<Utc> => DateTime,
    NaiveDateTime => NaiveDateTime,
    NaiveDate => NaiveDate,
);

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::String(value.to_string())
    }
}

impl From<&String> for BindValue {
    fn from(value: &String) -> Self {
        BindValue::String(value.clone())
    }
}

/// `None` 绑定为 SQL `NULL`
impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => BindValue::Null,
        }
    }
}

/// 构建 WHERE 子句的参数列表
///
/// ```ignore
/// let user: TestUser = db.find("WHERE `first_name` LIKE ?", params!["user1"]).await?;
/// let all: Vec<TestUser> = db.find_all("WHERE 1=1", params![]).await?;
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::BindValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::BindValue::from($value)),+]
    };
}

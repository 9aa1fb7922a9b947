//! Record 描述信息
//!
//! `#[derive(Record)]` 为每个结构体生成一份编译期描述：表名、主键字段、
//! 按声明顺序排列的 (字段名, 列名) 列表，以及把字段值转换为 [`BindValue`] 的方法。
//! 这里的辅助函数按 "跳过列表" 过滤列和值，供 SQL 生成使用。

use crate::bind::BindValue;
use crate::error::{Result, SqlxRecordError};

/// 主键 ID 类型
pub type Id = i64;

/// 空的跳过列表
pub const EMPTY_SKIP_LIST: &[&str] = &[];

/// 字段元数据，由 derive(Record) 生成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust 字段名（跳过列表按它匹配）
    pub name: &'static str,
    /// SQL 列名
    pub column: &'static str,
}

/// 与数据表一一对应的记录类型
///
/// 一般通过 `#[derive(Record)]` 实现：
///
/// ```ignore
/// #[derive(Debug, Default, sqlxrecord::Record)]
/// #[record(table = "test_table")]
/// struct TestUser {
///     #[column("id")]
///     id: i64,
///     #[column("first_name")]
///     first: String,
///     #[column("last_name")]
///     last: Option<String>,
///     // 没有 #[column] 的字段不参与任何 SQL
///     scratch: String,
/// }
/// ```
///
/// 手写实现时，`values()` 必须与 `FIELDS` 等长且顺序一致，
/// 行解码（`sqlx::FromRow`）也必须按 `FIELDS` 的顺序读取列。
pub trait Record: Sized + Send + Sync + Unpin {
    /// 表名
    const TABLE: &'static str;
    /// 主键字段名（Rust 字段名，不是列名）
    const PK: &'static str;
    /// 所有带列标记的字段，按声明顺序
    const FIELDS: &'static [FieldMeta];

    /// 字段值，与 `FIELDS` 一一对应
    fn values(&self) -> Vec<BindValue>;

    /// 主键的当前值
    fn pk_value(&self) -> BindValue;
}

/// 不区分大小写地判断字段是否在跳过列表中
fn in_skip_list(skip: &[&str], name: &str) -> bool {
    skip.iter().any(|s| s.eq_ignore_ascii_case(name))
}

/// 按声明顺序返回列名，跳过 `skip` 中的字段
pub fn columns<M: Record>(skip: &[&str]) -> Vec<&'static str> {
    M::FIELDS
        .iter()
        .filter(|f| !in_skip_list(skip, f.name))
        .map(|f| f.column)
        .collect()
}

/// 主键对应的列名
pub fn pk_column<M: Record>() -> Result<&'static str> {
    M::FIELDS
        .iter()
        .find(|f| f.name == M::PK)
        .map(|f| f.column)
        .ok_or_else(|| invalid::<M>(format!("primary key field `{}` has no column", M::PK)))
}

/// 验证标识符是否安全
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn invalid<M>(reason: String) -> SqlxRecordError {
    SqlxRecordError::InvalidRecord {
        record: std::any::type_name::<M>(),
        reason,
    }
}

/// 检查描述信息是否完整
///
/// derive 生成的实现在编译期已经保证这些条件；这里兜住手写实现。
pub fn validate<M: Record>() -> Result<()> {
    if !is_safe_identifier(M::TABLE) {
        return Err(invalid::<M>(format!("unsafe table name `{}`", M::TABLE)));
    }
    if M::FIELDS.is_empty() {
        return Err(invalid::<M>("no column fields".to_string()));
    }
    for (i, field) in M::FIELDS.iter().enumerate() {
        if !is_safe_identifier(field.column) {
            return Err(invalid::<M>(format!(
                "unsafe column name `{}` on field `{}`",
                field.column, field.name
            )));
        }
        if M::FIELDS[..i].iter().any(|f| f.column == field.column) {
            return Err(invalid::<M>(format!("duplicate column `{}`", field.column)));
        }
    }
    pk_column::<M>()?;
    Ok(())
}

/// 取出字段值并按跳过列表过滤，同时检查值的数量与描述一致
pub(crate) fn checked_values<M: Record>(record: &M, skip: &[&str]) -> Result<Vec<BindValue>> {
    let values = record.values();
    if values.len() != M::FIELDS.len() {
        return Err(invalid::<M>(format!(
            "values() returned {} values for {} fields",
            values.len(),
            M::FIELDS.len()
        )));
    }
    Ok(M::FIELDS
        .iter()
        .zip(values)
        .filter(|(f, _)| !in_skip_list(skip, f.name))
        .map(|(_, v)| v)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Manual {
        id: i64,
        first: String,
        last: Option<String>,
    }

    impl Record for Manual {
        const TABLE: &'static str = "test_table";
        const PK: &'static str = "id";
        const FIELDS: &'static [FieldMeta] = &[
            FieldMeta { name: "id", column: "id" },
            FieldMeta { name: "first", column: "first_name" },
            FieldMeta { name: "last", column: "last_name" },
        ];

        fn values(&self) -> Vec<BindValue> {
            vec![
                self.id.into(),
                self.first.clone().into(),
                self.last.clone().into(),
            ]
        }

        fn pk_value(&self) -> BindValue {
            self.id.into()
        }
    }

    struct NoPk;

    impl Record for NoPk {
        const TABLE: &'static str = "no_pk";
        const PK: &'static str = "id";
        const FIELDS: &'static [FieldMeta] = &[FieldMeta { name: "name", column: "name" }];

        fn values(&self) -> Vec<BindValue> {
            vec![BindValue::Null]
        }

        fn pk_value(&self) -> BindValue {
            BindValue::Null
        }
    }

    struct BadTable;

    impl Record for BadTable {
        const TABLE: &'static str = "users; DROP TABLE users";
        const PK: &'static str = "id";
        const FIELDS: &'static [FieldMeta] = &[FieldMeta { name: "id", column: "id" }];

        fn values(&self) -> Vec<BindValue> {
            vec![BindValue::Null]
        }

        fn pk_value(&self) -> BindValue {
            BindValue::Null
        }
    }

    fn manual() -> Manual {
        Manual {
            id: 3,
            first: "user1".to_string(),
            last: None,
        }
    }

    #[test]
    fn test_columns_in_declaration_order() {
        assert_eq!(
            columns::<Manual>(EMPTY_SKIP_LIST),
            vec!["id", "first_name", "last_name"]
        );
    }

    #[test]
    fn test_skip_list_is_case_insensitive() {
        assert_eq!(columns::<Manual>(&["ID"]), vec!["first_name", "last_name"]);
        assert_eq!(columns::<Manual>(&["Id", "LAST"]), vec!["first_name"]);
    }

    #[test]
    fn test_skip_list_matches_field_name_not_column() {
        // first_name 是列名，字段名是 first
        assert_eq!(
            columns::<Manual>(&["first_name"]),
            vec!["id", "first_name", "last_name"]
        );
    }

    #[test]
    fn test_pk_column() {
        assert_eq!(pk_column::<Manual>().unwrap(), "id");
        assert!(pk_column::<NoPk>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(validate::<Manual>().is_ok());

        let err = validate::<NoPk>().unwrap_err();
        assert!(matches!(err, SqlxRecordError::InvalidRecord { .. }));

        let err = validate::<BadTable>().unwrap_err();
        assert!(err.to_string().contains("unsafe table name"));
    }

    #[test]
    fn test_checked_values() {
        // 与 columns 使用同一个跳过列表时一一对应
        let values = checked_values(&manual(), &["id"]).unwrap();
        assert_eq!(
            values,
            vec![BindValue::String("user1".into()), BindValue::Null]
        );
        assert_eq!(checked_values(&manual(), EMPTY_SKIP_LIST).unwrap().len(), 3);

        struct Short;
        impl Record for Short {
            const TABLE: &'static str = "short";
            const PK: &'static str = "id";
            const FIELDS: &'static [FieldMeta] = &[
                FieldMeta { name: "id", column: "id" },
                FieldMeta { name: "name", column: "name" },
            ];
            fn values(&self) -> Vec<BindValue> {
                vec![BindValue::Int64(1)]
            }
            fn pk_value(&self) -> BindValue {
                BindValue::Int64(1)
            }
        }
        assert!(checked_values(&Short, EMPTY_SKIP_LIST).is_err());
    }

    #[test]
    fn test_is_safe_identifier() {
        assert!(is_safe_identifier("first_name"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("first name"));
        assert!(!is_safe_identifier("a`b"));
    }
}

//! SQL 语句生成
//!
//! 根据 [`Record`] 的描述信息拼出 INSERT / UPDATE / DELETE / SELECT，
//! 同时按占位符顺序收集绑定值。这里只生成文本，不访问数据库。

use crate::backend::{Backend, DbDriver};
use crate::bind::BindValue;
use crate::error::Result;
use crate::record::{self, Record, EMPTY_SKIP_LIST};

/// 一条待执行的语句：SQL 文本加上按顺序排列的绑定值
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    binds: Vec<BindValue>,
}

fn escaped_columns<DB: Backend>(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| DB::escape_identifier(c)).collect()
}

fn placeholders<DB: Backend>(count: usize) -> Vec<String> {
    (0..count).map(DB::placeholder).collect()
}

impl Statement {
    /// `INSERT INTO <table> (<列，主键除外>) VALUES (?, ...)`
    ///
    /// 没有非主键列时插入一行默认值。
    pub fn insert<DB: Backend, M: Record>(record: &M) -> Result<Self> {
        let skip = [M::PK];
        let escaped_table = DB::escape_identifier(M::TABLE);
        let columns = escaped_columns::<DB>(&record::columns::<M>(&skip));
        let binds = record::checked_values(record, &skip)?;

        let sql = if columns.is_empty() {
            match DB::get_driver() {
                DbDriver::MySql => format!("INSERT INTO {} () VALUES ()", escaped_table),
                DbDriver::Sqlite => format!("INSERT INTO {} DEFAULT VALUES", escaped_table),
            }
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                escaped_table,
                columns.join(", "),
                placeholders::<DB>(columns.len()).join(", ")
            )
        };

        Ok(Self { sql, binds })
    }

    /// `UPDATE <table> SET <col> = ?, ... WHERE <pk> = ?`
    ///
    /// 主键值作为最后一个绑定值。没有非主键列时返回 `None`。
    pub fn update<DB: Backend, M: Record>(record: &M) -> Result<Option<Self>> {
        let skip = [M::PK];
        let escaped_table = DB::escape_identifier(M::TABLE);
        let escaped_pk = DB::escape_identifier(record::pk_column::<M>()?);
        let columns = escaped_columns::<DB>(&record::columns::<M>(&skip));
        if columns.is_empty() {
            return Ok(None);
        }

        let set_parts: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = {}", col, DB::placeholder(i)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            escaped_table,
            set_parts.join(", "),
            escaped_pk,
            DB::placeholder(set_parts.len())
        );

        let mut binds = record::checked_values(record, &skip)?;
        binds.push(record.pk_value());

        Ok(Some(Self { sql, binds }))
    }

    /// `DELETE FROM <table> WHERE <pk> = ?`
    pub fn delete<DB: Backend, M: Record>(record: &M) -> Result<Self> {
        let escaped_table = DB::escape_identifier(M::TABLE);
        let escaped_pk = DB::escape_identifier(record::pk_column::<M>()?);
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            escaped_table,
            escaped_pk,
            DB::placeholder(0)
        );
        Ok(Self {
            sql,
            binds: vec![record.pk_value()],
        })
    }

    /// `SELECT <全部列> FROM <table> <where_clause>`
    ///
    /// `where_clause` 原样拼接在表名之后，可以包含别名、`WHERE`、`ORDER BY`、`LIMIT` 等；
    /// `params` 按顺序绑定到其中的占位符。
    pub fn select<DB: Backend, M: Record>(where_clause: &str, params: Vec<BindValue>) -> Self {
        let escaped_table = DB::escape_identifier(M::TABLE);
        let columns = escaped_columns::<DB>(&record::columns::<M>(EMPTY_SKIP_LIST));

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), escaped_table);
        let where_clause = where_clause.trim();
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(where_clause);
        }

        Self { sql, binds: params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn into_parts(self) -> (String, Vec<BindValue>) {
        (self.sql, self.binds)
    }
}

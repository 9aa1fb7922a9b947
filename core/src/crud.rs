//! 泛型 CRUD 实现
//!
//! 所有函数都对 `sqlx::Executor` 泛型，既可以传 `&Pool<DB>`，
//! 也可以传事务里的 `&mut DB::Connection`。[`Dbo`](crate::Dbo) 和
//! [`Tx`](crate::Tx) 的方法都委托到这里。
//!
//! ```rust,ignore
//! use sqlxrecord::crud;
//!
//! let id = crud::create::<sqlx::Sqlite, _, _>(&pool, &user).await?;
//! let user: TestUser = crud::find::<sqlx::Sqlite, _, _>(&pool, "WHERE id = ?", params![id]).await?;
//! ```

use crate::backend::Backend;
use crate::bind::BindValue;
use crate::error::{Result, SqlxRecordError};
use crate::record::{self, Id, Record};
use crate::statement::Statement;
use sqlx::query::{Query, QueryAs};
use sqlx::Database;

/// 应用绑定值之前逐个检查，后端无法表示的值返回 `DatabaseError(sqlx::Error::Encode)`
fn check_binds<DB: Backend>(binds: &[BindValue]) -> Result<()> {
    for bind in binds {
        DB::check_bind_value(bind)
            .map_err(|e| SqlxRecordError::DatabaseError(sqlx::Error::Encode(e)))?;
    }
    Ok(())
}

/// 按顺序应用绑定值（用于 query）
fn apply_binds<'q, DB: Backend>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    binds: Vec<BindValue>,
) -> Query<'q, DB, <DB as Database>::Arguments<'q>> {
    for bind in binds {
        query = DB::bind_value(query, bind);
    }
    query
}

/// 按顺序应用绑定值（用于 query_as）
fn apply_binds_as<'q, DB: Backend, O>(
    mut query: QueryAs<'q, DB, O, <DB as Database>::Arguments<'q>>,
    binds: Vec<BindValue>,
) -> QueryAs<'q, DB, O, <DB as Database>::Arguments<'q>> {
    for bind in binds {
        query = DB::bind_value_as(query, bind);
    }
    query
}

fn log_statement<DB: Backend>(table: &str, sql: &str, binds: usize) {
    tracing::debug!(
        backend = DB::get_driver().name(),
        table,
        binds,
        sql,
        "executing statement"
    );
}

/// 插入记录，返回数据库生成的主键
///
/// 主键字段不参与插入，其余带列标记的字段按声明顺序绑定。
pub async fn create<'c, DB, M, E>(executor: E, record: &M) -> Result<Id>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    record::validate::<M>()?;
    let (sql, binds) = Statement::insert::<DB, M>(record)?.into_parts();
    check_binds::<DB>(&binds)?;
    log_statement::<DB>(M::TABLE, &sql, binds.len());

    let result = apply_binds(sqlx::query::<DB>(&sql), binds)
        .execute(executor)
        .await?;
    Ok(DB::last_insert_id(&result))
}

/// 按主键更新记录的其余列，返回受影响的行数
///
/// 没有非主键列时不执行任何语句，直接返回 0。
pub async fn update<'c, DB, M, E>(executor: E, record: &M) -> Result<u64>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    record::validate::<M>()?;
    let Some(stmt) = Statement::update::<DB, M>(record)? else {
        return Ok(0);
    };
    let (sql, binds) = stmt.into_parts();
    check_binds::<DB>(&binds)?;
    log_statement::<DB>(M::TABLE, &sql, binds.len());

    let result = apply_binds(sqlx::query::<DB>(&sql), binds)
        .execute(executor)
        .await?;
    Ok(DB::rows_affected(&result))
}

/// 按主键删除记录，返回受影响的行数
pub async fn delete<'c, DB, M, E>(executor: E, record: &M) -> Result<u64>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    record::validate::<M>()?;
    let (sql, binds) = Statement::delete::<DB, M>(record)?.into_parts();
    check_binds::<DB>(&binds)?;
    log_statement::<DB>(M::TABLE, &sql, binds.len());

    let result = apply_binds(sqlx::query::<DB>(&sql), binds)
        .execute(executor)
        .await?;
    Ok(DB::rows_affected(&result))
}

/// 查询单条记录
///
/// `where_clause` 原样拼在 `SELECT <列> FROM <表>` 之后。结果有多行时取第一行，
/// 没有结果时返回 [`SqlxRecordError::NotFound`]。
pub async fn find<'c, DB, M, E>(
    executor: E,
    where_clause: &str,
    params: Vec<BindValue>,
) -> Result<M>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    record::validate::<M>()?;
    let (sql, binds) = Statement::select::<DB, M>(where_clause, params).into_parts();
    check_binds::<DB>(&binds)?;
    log_statement::<DB>(M::TABLE, &sql, binds.len());

    apply_binds_as(sqlx::query_as::<DB, M>(&sql), binds)
        .fetch_optional(executor)
        .await?
        .ok_or(SqlxRecordError::NotFound)
}

/// 查询多条记录，按结果集顺序返回
pub async fn find_all<'c, DB, M, E>(
    executor: E,
    where_clause: &str,
    params: Vec<BindValue>,
) -> Result<Vec<M>>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    record::validate::<M>()?;
    let (sql, binds) = Statement::select::<DB, M>(where_clause, params).into_parts();
    check_binds::<DB>(&binds)?;
    log_statement::<DB>(M::TABLE, &sql, binds.len());

    let rows = apply_binds_as(sqlx::query_as::<DB, M>(&sql), binds)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// 与 [`find_all`] 相同，但把结果追加到已有的 `Vec` 末尾，返回追加的条数
pub async fn find_all_into<'c, DB, M, E>(
    executor: E,
    out: &mut Vec<M>,
    where_clause: &str,
    params: Vec<BindValue>,
) -> Result<usize>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    let rows = find_all::<DB, M, E>(executor, where_clause, params).await?;
    let appended = rows.len();
    out.extend(rows);
    Ok(appended)
}

/// 直接执行一条不带参数的 SQL（建表、清理数据等），返回受影响的行数
pub async fn execute<'c, DB, E>(executor: E, sql: &str) -> Result<u64>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    E: sqlx::Executor<'c, Database = DB> + Send,
{
    tracing::debug!(backend = DB::get_driver().name(), sql, "executing raw sql");
    let result = sqlx::query::<DB>(sql).execute(executor).await?;
    Ok(DB::rows_affected(&result))
}

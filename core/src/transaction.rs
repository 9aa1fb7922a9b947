use crate::backend::Backend;
use crate::bind::BindValue;
use crate::crud;
use crate::error::Result;
use crate::record::{Id, Record};
use sqlx::Database;
use std::fmt;

/// 宏：简化事务闭包的写法，自动处理 `Box::pin`
///
/// 使用示例：
/// ```ignore
/// sqlxrecord::transaction!(db, |tx| async move {
///     tx.create(&user).await?;
///     Ok::<_, SqlxRecordError>(())
/// }).await?;
/// ```
///
/// `db` 可以是 `Dbo` 的值或引用（`&db`），方法调用会自动解引用。
#[macro_export]
macro_rules! transaction {
    ($db:expr, |$tx:ident| async move $body:block) => {
        $db.transaction(|$tx| {
            ::std::boxed::Box::pin(async move $body)
        })
    };
}

/// 事务句柄
///
/// 独占一个池连接，所有语句都在这个连接上执行。通过 [`commit`](Tx::commit)
/// 或 [`rollback`](Tx::rollback) 结束；未提交就被 drop 时自动回滚。
pub struct Tx<DB: Database> {
    inner: sqlx::Transaction<'static, DB>,
}

impl<DB: Backend> Tx<DB> {
    pub(crate) fn new(inner: sqlx::Transaction<'static, DB>) -> Self {
        tracing::debug!(backend = DB::get_driver().name(), "transaction started");
        Self { inner }
    }

    /// 提交事务
    pub async fn commit(self) -> Result<()> {
        self.inner.commit().await?;
        tracing::debug!(backend = DB::get_driver().name(), "transaction committed");
        Ok(())
    }

    /// 回滚事务
    pub async fn rollback(self) -> Result<()> {
        self.inner.rollback().await?;
        tracing::debug!(backend = DB::get_driver().name(), "transaction rolled back");
        Ok(())
    }
}

impl<DB> Tx<DB>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    for<'c> &'c mut <DB as Database>::Connection: sqlx::Executor<'c, Database = DB>,
{
    pub async fn create<M: Record>(&mut self, record: &M) -> Result<Id> {
        crud::create::<DB, M, _>(&mut *self.inner, record).await
    }

    pub async fn update<M: Record>(&mut self, record: &M) -> Result<u64> {
        crud::update::<DB, M, _>(&mut *self.inner, record).await
    }

    pub async fn delete<M: Record>(&mut self, record: &M) -> Result<u64> {
        crud::delete::<DB, M, _>(&mut *self.inner, record).await
    }

    pub async fn find<M>(&mut self, where_clause: &str, params: Vec<BindValue>) -> Result<M>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find::<DB, M, _>(&mut *self.inner, where_clause, params).await
    }

    pub async fn find_all<M>(&mut self, where_clause: &str, params: Vec<BindValue>) -> Result<Vec<M>>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find_all::<DB, M, _>(&mut *self.inner, where_clause, params).await
    }

    pub async fn find_all_into<M>(
        &mut self,
        out: &mut Vec<M>,
        where_clause: &str,
        params: Vec<BindValue>,
    ) -> Result<usize>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find_all_into::<DB, M, _>(&mut *self.inner, out, where_clause, params).await
    }

    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        crud::execute::<DB, _>(&mut *self.inner, sql).await
    }
}

impl<DB: Backend> fmt::Debug for Tx<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("driver", &DB::get_driver())
            .finish_non_exhaustive()
    }
}

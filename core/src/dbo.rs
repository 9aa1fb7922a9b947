use crate::backend::Backend;
use crate::bind::BindValue;
use crate::crud;
use crate::error::{Result, SqlxRecordError};
use crate::record::{Id, Record};
use crate::transaction::Tx;
use sqlx::pool::PoolOptions;
use sqlx::{Connection, Database, Pool};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// 数据库访问对象
///
/// 持有一个 sqlx 连接池，克隆后共享同一个池。通过
/// [`MySqlDbo::connect`](crate::MySqlDbo) 或 [`SqliteDbo::open`](crate::SqliteDbo) 创建。
pub struct Dbo<DB: Database> {
    pool: Pool<DB>,
}

impl<DB: Database> Clone for Dbo<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<DB: Backend> fmt::Debug for Dbo<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dbo")
            .field("driver", &DB::get_driver())
            .field("pool", &self.pool)
            .finish()
    }
}

impl<DB: Backend> Dbo<DB> {
    /// 先单独建一个连接并 ping，失败时保留驱动返回的原始错误；成功后再建连接池
    pub(crate) async fn open_checked(
        options: <DB::Connection as Connection>::Options,
        pool_options: PoolOptions<DB>,
        dsn: &str,
    ) -> Result<Self> {
        let mut conn = <DB::Connection as Connection>::connect_with(&options)
            .await
            .map_err(|e| SqlxRecordError::connect(dsn, e))?;
        conn.ping()
            .await
            .map_err(|e| SqlxRecordError::connect(dsn, e))?;
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "closing check connection failed");
        }

        let pool = pool_options.connect_lazy_with(options);
        tracing::info!(
            backend = DB::get_driver().name(),
            max_connections = pool.options().get_max_connections(),
            "database connected"
        );
        Ok(Self { pool })
    }

    /// 底层连接池
    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    /// 关闭连接池，等待已借出的连接归还
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(backend = DB::get_driver().name(), "pool closed");
    }

    /// 开始一个事务
    pub async fn start_transaction(&self) -> Result<Tx<DB>> {
        let inner = self.pool.begin().await?;
        Ok(Tx::new(inner))
    }

    /// 在事务中执行闭包函数
    /// 如果闭包返回 Ok，则自动提交事务
    /// 如果闭包返回 Err，则自动回滚事务，返回闭包的错误
    ///
    /// # 使用方式
    ///
    /// 方式1：直接使用（需要 `Box::pin`）：
    /// ```ignore
    /// db.transaction(|tx| {
    ///     Box::pin(async move {
    ///         tx.create(&user).await
    ///     })
    /// }).await?;
    /// ```
    ///
    /// 方式2：使用宏：
    /// ```ignore
    /// sqlxrecord::transaction!(db, |tx| async move {
    ///     tx.create(&user).await
    /// }).await?;
    /// ```
    pub async fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        for<'a> F: FnOnce(
            &'a mut Tx<DB>,
        )
            -> Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'a>>,
        E: From<SqlxRecordError>,
    {
        let mut tx = self.start_transaction().await.map_err(E::from)?;

        match f(&mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(E::from)?;
                Ok(result)
            }
            Err(e) => {
                // 回滚失败只记录日志，返回闭包的原始错误
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl<DB> Dbo<DB>
where
    DB: Backend,
    for<'a> <DB as Database>::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    for<'c> &'c mut <DB as Database>::Connection: sqlx::Executor<'c, Database = DB>,
{
    /// 插入记录，返回新生成的主键
    pub async fn create<M: Record>(&self, record: &M) -> Result<Id> {
        crud::create::<DB, M, _>(&self.pool, record).await
    }

    /// 按主键更新，返回受影响的行数
    pub async fn update<M: Record>(&self, record: &M) -> Result<u64> {
        crud::update::<DB, M, _>(&self.pool, record).await
    }

    /// 按主键删除，返回受影响的行数
    pub async fn delete<M: Record>(&self, record: &M) -> Result<u64> {
        crud::delete::<DB, M, _>(&self.pool, record).await
    }

    /// 查询单条记录，没有结果时返回 `SqlxRecordError::NotFound`
    pub async fn find<M>(&self, where_clause: &str, params: Vec<BindValue>) -> Result<M>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find::<DB, M, _>(&self.pool, where_clause, params).await
    }

    /// 查询多条记录
    pub async fn find_all<M>(&self, where_clause: &str, params: Vec<BindValue>) -> Result<Vec<M>>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find_all::<DB, M, _>(&self.pool, where_clause, params).await
    }

    /// 查询多条记录并追加到 `out`
    pub async fn find_all_into<M>(
        &self,
        out: &mut Vec<M>,
        where_clause: &str,
        params: Vec<BindValue>,
    ) -> Result<usize>
    where
        M: Record + for<'r> sqlx::FromRow<'r, <DB as Database>::Row>,
    {
        crud::find_all_into::<DB, M, _>(&self.pool, out, where_clause, params).await
    }

    pub async fn execute(&self, sql: &str) -> Result<u64> {
        crud::execute::<DB, _>(&self.pool, sql).await
    }
}

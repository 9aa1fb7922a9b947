use sqlxrecord::{params, PoolConfig, Record, SqliteDbo, SqlxRecordError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Record)]
#[record(table = "test_table")]
struct TestUser {
    #[column("id")]
    id: i64,
    #[column("first_name")]
    first: String,
    #[column("last_name")]
    last: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 未设置时使用内存数据库；设置时文件必须已经存在
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| ":memory:".to_string());

    println!("Connecting to SQLite database...");
    let db = SqliteDbo::open_with(&database_url, &PoolConfig::from_env()).await?;
    println!("Connected successfully!\n");

    db.execute(r#"DROP TABLE IF EXISTS "test_table""#).await?;
    db.execute(
        r#"CREATE TABLE "test_table" ("id" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, "first_name" VARCHAR, "last_name" VARCHAR)"#,
    )
    .await?;

    // ========== 1. CREATE ==========
    println!("=== 1. CREATE (插入新记录) ===");
    for first in ["user1", "user2"] {
        let id = db
            .create(&TestUser {
                first: first.to_string(),
                last: Some("johnson".to_string()),
                ..Default::default()
            })
            .await?;
        println!("插入成功，ID: {}", id);
    }
    println!();

    // ========== 2. FIND ==========
    println!("=== 2. FIND (查询单条记录) ===");
    let mut user: TestUser = db
        .find("WHERE `first_name` LIKE ?", params!["user1"])
        .await?;
    println!("找到用户: {:?}\n", user);

    // ========== 3. UPDATE ==========
    println!("=== 3. UPDATE (更新记录) ===");
    user.last = Some("jackson".to_string());
    let affected = db.update(&user).await?;
    println!("更新成功，影响行数: {}\n", affected);

    // ========== 4. FIND_ALL ==========
    println!("=== 4. FIND_ALL (查询多条记录) ===");
    let users: Vec<TestUser> = db
        .find_all("AS tu WHERE tu.first_name != ''", params![])
        .await?;
    println!("找到 {} 条记录:", users.len());
    for u in &users {
        println!("  ID={}, first={}, last={:?}", u.id, u.first, u.last);
    }
    println!();

    // ========== 5. TRANSACTION ==========
    println!("=== 5. TRANSACTION (事务) ===");
    let mut tx = db.start_transaction().await?;
    tx.create(&TestUser {
        first: "user3".to_string(),
        ..Default::default()
    })
    .await?;
    tx.rollback().await?;
    println!("回滚后记录数: {}", db.find_all::<TestUser>("", params![]).await?.len());

    let id = sqlxrecord::transaction!(db, |tx| async move {
        tx.create(&TestUser {
            first: "user4".to_string(),
            last: Some("johnson".to_string()),
            ..Default::default()
        })
        .await
    })
    .await?;
    println!("事务提交成功，ID: {}\n", id);

    // ========== 6. DELETE ==========
    println!("=== 6. DELETE (删除记录) ===");
    let affected = db.delete(&user).await?;
    println!("删除成功，影响行数: {}", affected);
    match db.find::<TestUser>("WHERE id = ?", params![user.id]).await {
        Err(SqlxRecordError::NotFound) => println!("ID={} 已不存在\n", user.id),
        other => println!("意外结果: {:?}\n", other),
    }

    tracing::info!(table = TestUser::TABLE, pk = TestUser::PK, "demo finished");
    db.close().await;
    Ok(())
}

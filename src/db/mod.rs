use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Migrations embedded in the binary, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_storefront.sql",
    include_str!("../../migrations/0001_storefront.sql"),
)];

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to an in-memory database is its own database, so keep exactly one alive.
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("migration {name} failed"))?;
        }
        tracing::debug!(migration = %name, "migration applied");
    }
    Ok(())
}

pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

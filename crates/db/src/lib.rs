//! SQLite pool factory and migration runner.
//!
//! Modules contribute SQL migrations through [`library_kernel::Module::migrations`];
//! this crate applies them once each, recording applied ids in a bookkeeping table.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use library_kernel::settings::DatabaseSettings;
use library_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const MIGRATIONS_TABLE: &str = "_library_migrations";

/// Open a connection pool for the configured database URL.
///
/// In-memory databases are private to a connection, so their pool is pinned to a
/// single connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options =
        SqlitePoolOptions::new().acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms));

    pool_options = if settings.is_in_memory() {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "library-db", url = %settings.url, "database pool ready");

    Ok(pool)
}

/// Apply every migration not yet recorded, in the given order.
///
/// Each migration runs in its own transaction together with its bookkeeping row.
/// Returns the number of migrations applied by this call.
pub async fn apply_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    let create_table = format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            module     TEXT NOT NULL,
            id         TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (module, id)
        )"
    );
    sqlx::query(&create_table)
        .execute(pool)
        .await
        .with_context(|| "failed to create migrations table")?;

    let select_applied = format!("SELECT COUNT(*) FROM {MIGRATIONS_TABLE} WHERE module = ? AND id = ?");
    let insert_applied = format!("INSERT INTO {MIGRATIONS_TABLE} (module, id) VALUES (?, ?)");

    let mut applied = 0;
    for (module, migration) in migrations {
        let (already_applied,): (i64,) = sqlx::query_as(&select_applied)
            .bind(module)
            .bind(migration.id)
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to read migration state for {module}/{}", migration.id))?;

        if already_applied > 0 {
            tracing::debug!(target: "library-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {module}/{} failed", migration.id))?;
        sqlx::query(&insert_applied)
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {module}/{}", migration.id))?;

        tracing::info!(target: "library-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

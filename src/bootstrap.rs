//! Application wiring shared by the `library-app` binary and the CLI.

use anyhow::Context;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// Open the pool and register every application module over it.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(SqlitePool, ModuleRegistry)> {
    let pool = library_db::connect(&settings.database)
        .await
        .with_context(|| "failed to open database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool, settings);

    Ok((pool, registry))
}

/// Apply pending module migrations, returning how many ran.
pub async fn migrate(pool: &SqlitePool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = library_db::apply_migrations(pool, &migrations)
        .await
        .with_context(|| "failed to apply migrations")?;

    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Run the service until shutdown: migrate if configured, bring modules up,
/// serve HTTP, then stop modules in reverse order.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (pool, registry) = prepare(&settings).await?;

    if settings.database.run_migrations {
        migrate(&pool, &registry).await?;
    }

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("library-app bootstrap complete");

    let served = library_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    pool.close().await;

    served
}

pub mod books;

use library_kernel::{settings::Settings, ModuleRegistry};
use sqlx::SqlitePool;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool, settings: &Settings) {
    registry.register(books::create_module(pool.clone(), settings.pagination));
}

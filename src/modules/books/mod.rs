pub mod error;
pub mod models;
mod openapi;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{settings::PaginationSettings, InitCtx, Migration, Module};
use sqlx::SqlitePool;

use repository::{BookRepository, SqliteBookRepository};
use routes::BookState;
use service::BookService;

/// Module name, also the path segment the routes mount under.
pub const MODULE_NAME: &str = "book";

const BOOK_TABLE_MIGRATION: &str = r#"
    CREATE TABLE IF NOT EXISTS book (
        book_id INTEGER PRIMARY KEY AUTOINCREMENT,
        title   TEXT NOT NULL CHECK (title <> ''),
        author  TEXT NOT NULL CHECK (author <> ''),
        isbn    TEXT NOT NULL CHECK (isbn <> ''),
        CONSTRAINT book_title_unique UNIQUE (title),
        CONSTRAINT book_isbn_unique UNIQUE (isbn)
    );
    CREATE INDEX IF NOT EXISTS book_author_idx ON book (author);
"#;

fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_create_book",
        up: BOOK_TABLE_MIGRATION,
    }]
}

/// Book catalogue module
pub struct BooksModule {
    state: BookState,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>, pagination: PaginationSettings) -> Self {
        Self {
            state: BookState {
                service,
                pagination,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let (books,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book")
            .fetch_one(ctx.db)
            .await?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

/// Create the book module over the given pool
pub fn create_module(pool: SqlitePool, pagination: PaginationSettings) -> Arc<dyn Module> {
    let repository: Arc<dyn BookRepository> = Arc::new(SqliteBookRepository::new(pool));
    let service = Arc::new(BookService::new(repository));
    Arc::new(BooksModule::new(service, pagination))
}

#[cfg(test)]
pub(crate) mod test_support {
    use library_kernel::settings::DatabaseSettings;
    use sqlx::SqlitePool;

    /// Fresh in-memory database with the book table in place.
    pub async fn memory_pool() -> SqlitePool {
        let settings = DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        };
        let pool = library_db::connect(&settings).await.unwrap();
        let migrations: Vec<_> = super::migrations()
            .into_iter()
            .map(|migration| (super::MODULE_NAME.to_string(), migration))
            .collect();
        library_db::apply_migrations(&pool, &migrations)
            .await
            .unwrap();
        pool
    }
}

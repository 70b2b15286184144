use async_trait::async_trait;
use library_kernel::{Page, PageRequest};
use sqlx::SqlitePool;

use super::error::RepositoryError;
use super::models::{Book, BookId, BookSortKey, NewBook};
use crate::utils::escape_like;

pub type BookPageRequest = PageRequest<BookSortKey>;

/// Storage operations on the book table.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    async fn find_all(&self, request: &BookPageRequest) -> Result<Page<Book>, RepositoryError>;

    /// Books whose author contains `author`, using the store's `LIKE` collation.
    async fn find_by_author_containing(
        &self,
        author: &str,
        request: &BookPageRequest,
    ) -> Result<Page<Book>, RepositoryError>;

    async fn exists_by_title(&self, title: &str) -> Result<bool, RepositoryError>;

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, RepositoryError>;

    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError>;

    /// Overwrite every mutable column of an existing row.
    async fn update(&self, book: &Book) -> Result<Book, RepositoryError>;

    async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError>;
}

/// [`BookRepository`] backed by the SQLite `book` table.
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

const BOOK_COLUMNS: &str = "book_id, title, author, isbn";
const AUTHOR_FILTER: &str = "author LIKE '%' || ? || '%' ESCAPE '\\'";

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        author_pattern: Option<String>,
        request: &BookPageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let filter = if author_pattern.is_some() {
            format!(" WHERE {AUTHOR_FILTER}")
        } else {
            String::new()
        };

        // Secondary ordering on the id keeps pages stable when the sort column repeats.
        let select = format!(
            "SELECT {BOOK_COLUMNS} FROM book{filter} ORDER BY {column} {direction}, book_id ASC LIMIT ? OFFSET ?",
            column = request.sort.key.column(),
            direction = request.sort.direction.as_sql(),
        );
        let count = format!("SELECT COUNT(*) FROM book{filter}");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count);
        let mut select_query = sqlx::query_as::<_, Book>(&select);
        if let Some(pattern) = author_pattern {
            count_query = count_query.bind(pattern.clone());
            select_query = select_query.bind(pattern);
        }

        let total = count_query.fetch_one(&self.pool).await?;
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let books = select_query
            .bind(i64::from(request.size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(books, request, total.max(0) as u64))
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE book_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_all(&self, request: &BookPageRequest) -> Result<Page<Book>, RepositoryError> {
        self.fetch_page(None, request).await
    }

    async fn find_by_author_containing(
        &self,
        author: &str,
        request: &BookPageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        self.fetch_page(Some(escape_like(author)), request).await
    }

    async fn exists_by_title(&self, title: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM book WHERE title = ?)")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM book WHERE isbn = ?)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO book (title, author, isbn) VALUES (?, ?, ?) RETURNING {BOOK_COLUMNS}"
        ))
        .bind(book.title)
        .bind(book.author)
        .bind(book.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn update(&self, book: &Book) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE book SET title = ?, author = ?, isbn = ? WHERE book_id = ? RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::Missing(book.book_id))
    }

    async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM book WHERE book_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Missing(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::error::UniqueField;
    use crate::modules::books::test_support::memory_pool;
    use library_kernel::{Direction, Sort};

    fn new_book(title: &str, author: &str, isbn: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
        }
    }

    async fn seeded() -> SqliteBookRepository {
        let repository = SqliteBookRepository::new(memory_pool().await);
        for (title, author, isbn) in [
            ("The Go Programming Language", "Alan A.A. Donovan", "9780134190440"),
            ("Effective Java", "Joshua Bloch", "0134685997"),
            ("Java Puzzlers", "Joshua Bloch", "032133678X"),
        ] {
            repository.insert(new_book(title, author, isbn)).await.unwrap();
        }
        repository
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_find_by_id_reads_back() {
        let repository = seeded().await;

        let book = repository.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(book.title, "Effective Java");
        assert!(repository.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_columns_are_enforced_by_the_table() {
        let repository = seeded().await;

        let err = repository
            .insert(new_book("Clean Architecture", "Robert Martin", "9780134190440"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(UniqueField::Isbn)));

        let err = repository
            .insert(new_book("Effective Java", "Someone Else", "1111111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(UniqueField::Title)));

        let mut book = repository.find_by_id(3).await.unwrap().unwrap();
        book.isbn = "0134685997".to_string();
        let err = repository.update(&book).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(UniqueField::Isbn)));
    }

    #[tokio::test]
    async fn pages_are_ordered_and_counted() {
        let repository = seeded().await;

        let page = repository
            .find_all(&PageRequest::new(0, 2, Sort::default()))
            .await
            .unwrap();
        let ids: Vec<BookId> = page.content.iter().map(|book| book.book_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);

        let page = repository
            .find_all(&PageRequest::new(1, 2, Sort::default()))
            .await
            .unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(page.last);

        let by_title_desc = Sort {
            key: BookSortKey::Title,
            direction: Direction::Desc,
        };
        let page = repository
            .find_all(&PageRequest::new(0, 10, by_title_desc))
            .await
            .unwrap();
        assert_eq!(page.content[0].title, "The Go Programming Language");
        assert_eq!(page.content[2].title, "Effective Java");
    }

    #[tokio::test]
    async fn author_filter_matches_substrings_case_insensitively() {
        let repository = seeded().await;
        let request = PageRequest::first(10);

        let page = repository
            .find_by_author_containing("donovan", &request)
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].isbn, "9780134190440");

        let page = repository
            .find_by_author_containing("Bloch", &request)
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);

        let page = repository
            .find_by_author_containing("%", &request)
            .await
            .unwrap();
        assert!(page.empty);
    }

    #[tokio::test]
    async fn exists_checks_and_delete() {
        let repository = seeded().await;

        assert!(repository.exists_by_title("Effective Java").await.unwrap());
        assert!(!repository.exists_by_title("effective java ").await.unwrap());
        assert!(repository.exists_by_isbn("032133678X").await.unwrap());

        repository.delete_by_id(3).await.unwrap();
        assert!(!repository.exists_by_isbn("032133678X").await.unwrap());
        assert!(matches!(
            repository.delete_by_id(3).await.unwrap_err(),
            RepositoryError::Missing(3)
        ));
    }

    #[tokio::test]
    async fn updating_a_deleted_row_reports_missing() {
        let repository = seeded().await;
        let book = repository.find_by_id(1).await.unwrap().unwrap();
        repository.delete_by_id(1).await.unwrap();

        assert!(matches!(
            repository.update(&book).await.unwrap_err(),
            RepositoryError::Missing(1)
        ));
    }
}

use std::sync::Arc;

use library_kernel::Page;

use super::error::BookError;
use super::models::{Book, BookId, BookView, CreateBookRequest, UpdateBookRequest};
use super::repository::{BookPageRequest, BookRepository};
use crate::utils::non_blank;

/// Book lifecycle and integrity rules.
///
/// On create the isbn is checked before the title; on update the title is
/// checked before the isbn. The checks are a fast path; the unique indexes
/// remain authoritative and their violations surface as the same errors.
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Page of books, filtered by author substring when the filter is not blank.
    pub async fn list_books(
        &self,
        author: Option<&str>,
        request: &BookPageRequest,
    ) -> Result<Page<BookView>, BookError> {
        let page = match author.filter(|author| non_blank(author)) {
            Some(author) => {
                tracing::debug!(%author, page = request.page, "listing books by author");
                self.repository
                    .find_by_author_containing(author, request)
                    .await?
            }
            None => {
                tracing::debug!(page = request.page, "listing books");
                self.repository.find_all(request).await?
            }
        };

        Ok(page.map(BookView::from))
    }

    pub async fn get_book_by_id(&self, id: BookId) -> Result<BookView, BookError> {
        self.get_book(id).await.map(BookView::from)
    }

    pub async fn create_book(&self, request: CreateBookRequest) -> Result<BookView, BookError> {
        let new_book = request.validate().map_err(BookError::Invalid)?;

        if self.repository.exists_by_isbn(&new_book.isbn).await? {
            tracing::warn!(isbn = %new_book.isbn, "isbn already used");
            return Err(BookError::DuplicateIsbn);
        }
        if self.repository.exists_by_title(&new_book.title).await? {
            tracing::warn!(title = %new_book.title, "title already used");
            return Err(BookError::DuplicateTitle);
        }

        tracing::info!(title = %new_book.title, "saving book");
        let saved = self.repository.insert(new_book).await?;
        Ok(saved.into())
    }

    /// Merge the non-blank fields of `request` into the stored book.
    ///
    /// Re-submitting a book's own current title or isbn is a no-op, not a conflict.
    pub async fn update_book(
        &self,
        id: BookId,
        request: UpdateBookRequest,
    ) -> Result<BookView, BookError> {
        let mut book = self.get_book(id).await?;

        if let Some(title) = request.title() {
            if title != book.title {
                if self.repository.exists_by_title(title).await? {
                    tracing::warn!(book_id = id, %title, "title already used");
                    return Err(BookError::DuplicateTitle);
                }
                book.title = title.to_string();
            }
        }

        if let Some(isbn) = request.isbn() {
            if isbn != book.isbn {
                if self.repository.exists_by_isbn(isbn).await? {
                    tracing::warn!(book_id = id, %isbn, "isbn already used");
                    return Err(BookError::DuplicateIsbn);
                }
                book.isbn = isbn.to_string();
            }
        }

        if let Some(author) = request.author() {
            book.author = author.to_string();
        }

        tracing::info!(book_id = id, "updating book");
        let updated = self.repository.update(&book).await?;
        Ok(updated.into())
    }

    pub async fn delete_book(&self, id: BookId) -> Result<(), BookError> {
        let book = self.get_book(id).await?;
        tracing::info!(book_id = id, title = %book.title, "deleting book");
        self.repository.delete_by_id(id).await?;
        Ok(())
    }

    async fn get_book(&self, id: BookId) -> Result<Book, BookError> {
        tracing::debug!(book_id = id, "looking up book");
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            tracing::warn!(book_id = id, "book not found");
            BookError::NotFound(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::error::RepositoryError;
    use crate::modules::books::models::NewBook;
    use crate::modules::books::repository::SqliteBookRepository;
    use crate::modules::books::test_support::memory_pool;
    use async_trait::async_trait;
    use library_kernel::PageRequest;

    const GO_TITLE: &str = "The Go Programming Language";
    const GO_ISBN: &str = "9780134190440";

    async fn service() -> BookService {
        let repository = SqliteBookRepository::new(memory_pool().await);
        BookService::new(Arc::new(repository))
    }

    fn go_book() -> CreateBookRequest {
        CreateBookRequest::new(GO_TITLE, "Alan A.A. Donovan", GO_ISBN)
    }

    fn java_book() -> CreateBookRequest {
        CreateBookRequest::new("Effective Java", "Joshua Bloch", "0134685997")
    }

    fn first_page() -> BookPageRequest {
        PageRequest::first(10)
    }

    #[tokio::test]
    async fn created_book_is_resolvable_by_id() {
        let service = service().await;

        let created = service.create_book(go_book()).await.unwrap();
        let fetched = service.get_book_by_id(created.book_id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, GO_TITLE);
    }

    #[tokio::test]
    async fn duplicate_isbn_is_rejected_before_title() {
        let service = service().await;
        service.create_book(go_book()).await.unwrap();

        // Same isbn and same title: the isbn conflict wins.
        let err = service.create_book(go_book()).await.unwrap_err();
        assert!(matches!(err, BookError::DuplicateIsbn));

        let err = service
            .create_book(CreateBookRequest::new(
                "Clean Architecture",
                "Robert Martin",
                GO_ISBN,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateIsbn));

        let page = service.list_books(None, &first_page()).await.unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn duplicate_title_with_distinct_isbn_is_rejected() {
        let service = service().await;
        service.create_book(go_book()).await.unwrap();

        let err = service
            .create_book(CreateBookRequest::new(GO_TITLE, "Someone", "0000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateTitle));
    }

    #[tokio::test]
    async fn blank_create_fields_are_rejected_without_writing() {
        let service = service().await;

        let err = service
            .create_book(CreateBookRequest::new(" ", "Joshua Bloch", ""))
            .await
            .unwrap_err();
        match err {
            BookError::Invalid(fields) => assert_eq!(fields, vec!["title", "isbn"]),
            other => panic!("expected invalid, got {other:?}"),
        }

        let page = service.list_books(None, &first_page()).await.unwrap();
        assert!(page.empty);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let service = service().await;

        assert!(matches!(
            service.get_book_by_id(42).await.unwrap_err(),
            BookError::NotFound(42)
        ));
        assert!(matches!(
            service
                .update_book(42, UpdateBookRequest::default())
                .await
                .unwrap_err(),
            BookError::NotFound(42)
        ));
        assert!(matches!(
            service.delete_book(42).await.unwrap_err(),
            BookError::NotFound(42)
        ));
    }

    #[tokio::test]
    async fn update_of_missing_book_checks_existence_before_integrity() {
        let service = service().await;
        let java = service.create_book(java_book()).await.unwrap();

        let request = UpdateBookRequest {
            title: Some(java.title.clone()),
            ..UpdateBookRequest::default()
        };
        assert!(matches!(
            service.update_book(java.book_id + 100, request).await.unwrap_err(),
            BookError::NotFound(_)
        ));
        assert_eq!(service.get_book_by_id(java.book_id).await.unwrap(), java);
    }

    #[tokio::test]
    async fn updating_only_the_title_keeps_other_fields() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();

        let request = UpdateBookRequest {
            title: Some("The Go Programming Language - Updated".to_string()),
            ..UpdateBookRequest::default()
        };
        service.update_book(go.book_id, request).await.unwrap();

        let fetched = service.get_book_by_id(go.book_id).await.unwrap();
        assert_eq!(fetched.title, "The Go Programming Language - Updated");
        assert_eq!(fetched.author, go.author);
        assert_eq!(fetched.isbn, go.isbn);
    }

    #[tokio::test]
    async fn blank_update_fields_are_no_ops() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();

        let request = UpdateBookRequest {
            title: Some("  ".to_string()),
            author: Some("Brian W. Kernighan".to_string()),
            isbn: None,
        };
        let updated = service.update_book(go.book_id, request).await.unwrap();

        assert_eq!(updated.title, GO_TITLE);
        assert_eq!(updated.isbn, GO_ISBN);
        assert_eq!(updated.author, "Brian W. Kernighan");
    }

    #[tokio::test]
    async fn update_conflicts_leave_the_row_untouched() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();
        let java = service.create_book(java_book()).await.unwrap();

        let request = UpdateBookRequest {
            title: Some(java.title.clone()),
            author: Some("Changed".to_string()),
            isbn: None,
        };
        assert!(matches!(
            service.update_book(go.book_id, request).await.unwrap_err(),
            BookError::DuplicateTitle
        ));

        let request = UpdateBookRequest {
            isbn: Some(java.isbn.clone()),
            ..UpdateBookRequest::default()
        };
        assert!(matches!(
            service.update_book(go.book_id, request).await.unwrap_err(),
            BookError::DuplicateIsbn
        ));

        // Title is checked first when both collide.
        let request = UpdateBookRequest {
            title: Some(java.title.clone()),
            isbn: Some(java.isbn.clone()),
            ..UpdateBookRequest::default()
        };
        assert!(matches!(
            service.update_book(go.book_id, request).await.unwrap_err(),
            BookError::DuplicateTitle
        ));

        assert_eq!(service.get_book_by_id(go.book_id).await.unwrap(), go);
    }

    #[tokio::test]
    async fn resubmitting_current_values_is_not_a_conflict() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();

        let request = UpdateBookRequest {
            title: Some(go.title.clone()),
            author: Some(go.author.clone()),
            isbn: Some(go.isbn.clone()),
        };
        assert_eq!(service.update_book(go.book_id, request).await.unwrap(), go);
    }

    #[tokio::test]
    async fn delete_removes_the_book_and_shrinks_the_listing() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();
        service.create_book(java_book()).await.unwrap();

        service.delete_book(go.book_id).await.unwrap();

        assert!(matches!(
            service.get_book_by_id(go.book_id).await.unwrap_err(),
            BookError::NotFound(_)
        ));
        let page = service.list_books(None, &first_page()).await.unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn listing_orders_by_id_and_filters_by_author() {
        let service = service().await;
        let go = service.create_book(go_book()).await.unwrap();
        let java = service.create_book(java_book()).await.unwrap();

        let page = service.list_books(None, &first_page()).await.unwrap();
        assert_eq!(page.content, vec![go.clone(), java]);

        let page = service.list_books(Some("Donovan"), &first_page()).await.unwrap();
        assert_eq!(page.content, vec![go]);

        let page = service.list_books(Some("   "), &first_page()).await.unwrap();
        assert_eq!(page.total_elements, 2);

        let page = service
            .list_books(Some("xyz-nonexistent"), &first_page())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
        assert!(page.content.is_empty());
    }

    /// Repository whose pre-checks never see the conflicting row, as when a
    /// concurrent writer commits between the check and the insert.
    struct RacingRepository {
        inner: SqliteBookRepository,
    }

    #[async_trait]
    impl BookRepository for RacingRepository {
        async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self, request: &BookPageRequest) -> Result<Page<Book>, RepositoryError> {
            self.inner.find_all(request).await
        }

        async fn find_by_author_containing(
            &self,
            author: &str,
            request: &BookPageRequest,
        ) -> Result<Page<Book>, RepositoryError> {
            self.inner.find_by_author_containing(author, request).await
        }

        async fn exists_by_title(&self, _title: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn exists_by_isbn(&self, _isbn: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError> {
            self.inner.insert(book).await
        }

        async fn update(&self, book: &Book) -> Result<Book, RepositoryError> {
            self.inner.update(book).await
        }

        async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError> {
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn constraint_violations_surface_as_duplicates() {
        let inner = SqliteBookRepository::new(memory_pool().await);
        let service = BookService::new(Arc::new(RacingRepository { inner }));
        let go = service.create_book(go_book()).await.unwrap();
        let java = service.create_book(java_book()).await.unwrap();

        let err = service
            .create_book(CreateBookRequest::new("Other", "Someone", GO_ISBN))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateIsbn));

        let err = service
            .create_book(CreateBookRequest::new(GO_TITLE, "Someone", "0000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateTitle));

        let request = UpdateBookRequest {
            title: Some(go.title.clone()),
            ..UpdateBookRequest::default()
        };
        let err = service.update_book(java.book_id, request).await.unwrap_err();
        assert!(matches!(err, BookError::DuplicateTitle));
    }

    struct BrokenRepository;

    #[async_trait]
    impl BookRepository for BrokenRepository {
        async fn find_by_id(&self, _id: BookId) -> Result<Option<Book>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn find_all(&self, _request: &BookPageRequest) -> Result<Page<Book>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn find_by_author_containing(
            &self,
            _author: &str,
            _request: &BookPageRequest,
        ) -> Result<Page<Book>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn exists_by_title(&self, _title: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn exists_by_isbn(&self, _isbn: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn insert(&self, _book: NewBook) -> Result<Book, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn update(&self, _book: &Book) -> Result<Book, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete_by_id(&self, _id: BookId) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn unexpected_storage_failures_are_storage_errors() {
        let service = BookService::new(Arc::new(BrokenRepository));

        assert!(matches!(
            service.create_book(java_book()).await.unwrap_err(),
            BookError::Storage(_)
        ));
        assert!(matches!(
            service.list_books(None, &first_page()).await.unwrap_err(),
            BookError::Storage(_)
        ));
        assert!(matches!(
            service.get_book_by_id(1).await.unwrap_err(),
            BookError::Storage(_)
        ));
    }
}

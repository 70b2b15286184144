use library_http::error::{AppError, FieldViolation};
use thiserror::Error;

use super::models::BookId;

const BOOK_NOT_FOUND: &str = "Book not found";

/// Column carrying a uniqueness guarantee on the book table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Title,
    Isbn,
}

/// Failures reported by a [`super::repository::BookRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),

    #[error("book {0} vanished before the write")]
    Missing(BookId),

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// Classify a driver error, recognising unique-index violations on the book table.
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let detail = db_err
                    .constraint()
                    .map(str::to_owned)
                    .unwrap_or_else(|| db_err.message().to_owned());
                if detail.contains("isbn") {
                    return RepositoryError::UniqueViolation(UniqueField::Isbn);
                }
                if detail.contains("title") {
                    return RepositoryError::UniqueViolation(UniqueField::Title);
                }
            }
        }
        RepositoryError::Database(err)
    }
}

/// Outcome of a failed book operation.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("Title already used")]
    DuplicateTitle,

    #[error("Isbn already used")]
    DuplicateIsbn,

    #[error("blank required fields: {0:?}")]
    Invalid(Vec<&'static str>),

    #[error("storage failure")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for BookError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation(UniqueField::Title) => BookError::DuplicateTitle,
            RepositoryError::UniqueViolation(UniqueField::Isbn) => BookError::DuplicateIsbn,
            RepositoryError::Missing(id) => BookError::NotFound(id),
            other => BookError::Storage(other),
        }
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(_) => AppError::not_found(BOOK_NOT_FOUND),
            BookError::DuplicateTitle | BookError::DuplicateIsbn => AppError::conflict(err.to_string()),
            BookError::Invalid(fields) => {
                AppError::validation(fields.into_iter().map(FieldViolation::blank).collect())
            }
            BookError::Storage(source) => {
                AppError::Internal(anyhow::Error::new(source).context("book storage failure"))
            }
        }
    }
}

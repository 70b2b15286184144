use std::str::FromStr;

use library_kernel::SortKey;
use serde::{Deserialize, Serialize};

use crate::utils::non_blank;

pub type BookId = i64;

/// Persisted book row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// A validated book that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Body of `POST /book`. Every field is required and must not be blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl CreateBookRequest {
    pub fn new(title: &str, author: &str, isbn: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            isbn: Some(isbn.to_string()),
        }
    }

    /// Check the required fields, returning the names of the blank ones in
    /// declaration order.
    pub fn validate(self) -> Result<NewBook, Vec<&'static str>> {
        let title = self.title.filter(|value| non_blank(value));
        let author = self.author.filter(|value| non_blank(value));
        let isbn = self.isbn.filter(|value| non_blank(value));

        match (title, author, isbn) {
            (Some(title), Some(author), Some(isbn)) => Ok(NewBook {
                title,
                author,
                isbn,
            }),
            (title, author, isbn) => Err([
                ("title", title.is_none()),
                ("author", author.is_none()),
                ("isbn", isbn.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, blank)| blank.then_some(field))
            .collect()),
        }
    }
}

/// Body of `PUT /book/{id}`. Blank or absent fields leave the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl UpdateBookRequest {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|value| non_blank(value))
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().filter(|value| non_blank(value))
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref().filter(|value| non_blank(value))
    }
}

/// Read projection returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
        }
    }
}

/// Properties the book listing can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookSortKey {
    #[default]
    BookId,
    Title,
    Author,
    Isbn,
}

impl BookSortKey {
    /// Column backing this property. Only these literals ever reach SQL.
    pub fn column(&self) -> &'static str {
        match self {
            BookSortKey::BookId => "book_id",
            BookSortKey::Title => "title",
            BookSortKey::Author => "author",
            BookSortKey::Isbn => "isbn",
        }
    }
}

impl FromStr for BookSortKey {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bookId" => Ok(BookSortKey::BookId),
            "title" => Ok(BookSortKey::Title),
            "author" => Ok(BookSortKey::Author),
            "isbn" => Ok(BookSortKey::Isbn),
            _ => Err(()),
        }
    }
}

impl SortKey for BookSortKey {
    fn property(&self) -> &'static str {
        match self {
            BookSortKey::BookId => "bookId",
            BookSortKey::Title => "title",
            BookSortKey::Author => "author",
            BookSortKey::Isbn => "isbn",
        }
    }
}

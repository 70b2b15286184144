//! Page requests and the page envelope returned by list endpoints.
//!
//! Page numbers are 0-based. A request always carries a sort so that paging
//! over a table is deterministic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::PaginationSettings;

/// Sort direction of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = PageQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(PageQueryError::InvalidDirection(other.to_string())),
        }
    }
}

/// A resource property a list endpoint can be sorted by.
pub trait SortKey: Copy + Default + FromStr + fmt::Debug + Send + Sync {
    /// Property name as exposed to clients (e.g. `bookId`).
    fn property(&self) -> &'static str;
}

/// Sort order of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort<K> {
    pub key: K,
    pub direction: Direction,
}

impl<K: SortKey> Sort<K> {
    /// Parse `property` or `property,direction`.
    pub fn parse(raw: &str) -> Result<Self, PageQueryError> {
        let mut parts = raw.splitn(2, ',');
        let property = parts.next().unwrap_or_default().trim();
        let key = property
            .parse::<K>()
            .map_err(|_| PageQueryError::UnknownSortProperty(property.to_string()))?;
        let direction = match parts.next() {
            Some(direction) => direction.parse()?,
            None => Direction::Asc,
        };
        Ok(Self { key, direction })
    }
}

/// Validated paging parameters handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<K> {
    pub page: u32,
    pub size: u32,
    pub sort: Sort<K>,
}

impl<K: SortKey> PageRequest<K> {
    pub fn new(page: u32, size: u32, sort: Sort<K>) -> Self {
        Self {
            page,
            size: size.max(1),
            sort,
        }
    }

    /// Default sort, first page of `size` elements.
    pub fn first(size: u32) -> Self {
        Self::new(0, size, Sort::default())
    }

    /// Row offset of the first element of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Raw `page`, `size` and `sort` query parameters.
///
/// Negative pages clamp to 0, non-positive sizes fall back to the configured
/// default and oversized pages clamp to the configured maximum.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn into_request<K: SortKey>(
        self,
        limits: &PaginationSettings,
    ) -> Result<PageRequest<K>, PageQueryError> {
        let page = self
            .page
            .map(|page| page.clamp(0, i64::from(u32::MAX)) as u32)
            .unwrap_or(0);

        let size = match self.size {
            Some(size) if size >= 1 => size.min(i64::from(limits.max_size)) as u32,
            _ => limits.default_size,
        };

        let sort = match self.sort.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Sort::parse(raw)?,
            _ => Sort::default(),
        };

        Ok(PageRequest::new(page, size, sort))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageQueryError {
    #[error("unknown sort property '{0}'")]
    UnknownSortProperty(String),

    #[error("unknown sort direction '{0}'; expected asc or desc")]
    InvalidDirection(String),
}

/// Sort description echoed back in the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SortInfo {
    pub property: &'static str,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
    pub page_size: u32,
    pub offset: u64,
    pub sort: SortInfo,
}

/// One page of results plus the metadata needed to walk the rest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub size: u32,
    pub number: u32,
    pub number_of_elements: usize,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new<K: SortKey>(content: Vec<T>, request: &PageRequest<K>, total_elements: u64) -> Self {
        let size = request.size.max(1);
        let total_pages = total_elements.div_ceil(u64::from(size));
        let number = request.page;

        Self {
            pageable: Pageable {
                page_number: number,
                page_size: size,
                offset: request.offset(),
                sort: SortInfo {
                    property: request.sort.key.property(),
                    direction: request.sort.direction,
                },
            },
            total_elements,
            total_pages,
            first: number == 0,
            last: u64::from(number) + 1 >= total_pages,
            size,
            number,
            number_of_elements: content.len(),
            empty: content.is_empty(),
            content,
        }
    }

    /// Convert the page items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
            size: self.size,
            number: self.number,
            number_of_elements: self.number_of_elements,
            empty: self.empty,
        }
    }
}

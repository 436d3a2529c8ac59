//! Fixed-size page windows over ordered selects.
//!
//! Feeds are paginated with a 1-based page number taken from a request
//! parameter. Out-of-range or unparsable page numbers are clamped to the
//! nearest valid page instead of erroring.

use quill_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

/// A requested page number, 1-based. Absent or unparsable input resolves
/// to the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    page: Option<u64>,
}

impl PageRequest {
    /// First page.
    #[must_use]
    pub const fn first() -> Self {
        Self { page: None }
    }

    /// Request a specific 1-based page.
    #[must_use]
    pub const fn page(page: u64) -> Self {
        Self { page: Some(page) }
    }

    /// Parse a raw request parameter. Non-numeric input is treated the
    /// same as an absent parameter.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        Self {
            page: raw.and_then(|s| s.trim().parse::<u64>().ok()),
        }
    }

    /// Resolve against the total page count, clamping into
    /// `[1, max(total_pages, 1)]`.
    #[must_use]
    pub fn resolve(self, total_pages: u64) -> u64 {
        self.page.unwrap_or(1).clamp(1, total_pages.max(1))
    }
}

/// One page of an ordered collection, plus paginator metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// The resolved (clamped) 1-based page number.
    pub page: u64,
    /// Page size used for the window.
    pub per_page: u64,
    /// Total number of pages (at least 1).
    pub total_pages: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
}

impl<T> Page<T> {
    /// Map the items of this page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

/// Fetch one clamped page of an ordered select.
pub async fn fetch_page<C, E>(
    db: &C,
    query: Select<E>,
    request: PageRequest,
    per_page: u64,
) -> AppResult<Page<E::Model>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let per_page = per_page.max(1);
    let paginator = query.paginate(db, per_page);

    let counts = paginator
        .num_items_and_pages()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let page = request.resolve(counts.number_of_pages);

    // Paginator pages are 0-based
    let items = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Page {
        items,
        page,
        per_page,
        total_pages: counts.number_of_pages.max(1),
        total_items: counts.number_of_items,
    })
}

//! Fixed-size page arithmetic shared by every listing.

use serde::{Deserialize, Serialize};

/// Number of items on every listing page.
pub const PAGE_SIZE: u64 = 10;

/// Highest page number whose offset fits in a `u64`.
pub const MAX_PAGE: u64 = u64::MAX / PAGE_SIZE;

/// A 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u64,
}

impl PageRequest {
    /// Page numbers below 1 are clamped to the first page.
    pub fn new(number: u64) -> Self {
        Self {
            number: number.max(1),
        }
    }

    pub fn first() -> Self {
        Self::new(1)
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Zero-based page index.
    pub fn index(&self) -> u64 {
        self.number - 1
    }

    pub fn offset(&self) -> u64 {
        self.index().saturating_mul(PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.number(),
            total_items,
            total_pages: total_items.div_ceil(PAGE_SIZE).max(1),
        }
    }

    /// Cut the requested page out of an already ordered collection.
    pub fn paginate(all: Vec<T>, request: PageRequest) -> Self {
        let total_items = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(PAGE_SIZE as usize)
            .collect();
        Self::new(items, request, total_items)
    }

    /// The first page always exists, even when the listing is empty.
    pub fn is_out_of_range(&self) -> bool {
        self.number > self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

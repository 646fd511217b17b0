//! Fixed-size page slicing

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// One-based page index and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }
}

/// A page of items plus totals over the whole input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
}

/// Number of pages for `total_count` items; at least 1
pub fn page_count(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size).max(1)
}

/// Slice `items` into the requested page
///
/// `total_pages` is never below 1, so an empty input still has an (empty)
/// page 1. A page index past the end, or 0, yields no items rather than an
/// error: the UI may ask for a stale page after the data shrank.
///
/// # Errors
/// `InvalidPageRequest` when `page_size` is 0.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Result<Page<T>> {
    if request.page_size == 0 {
        return Err(CoreError::InvalidPageRequest {
            page_size: request.page_size,
        });
    }

    let total_count = items.len();
    let total_pages = page_count(total_count, request.page_size);

    let page_items = match request.page_index.checked_sub(1) {
        Some(zero_based) if request.page_index <= total_pages => {
            let start = zero_based.saturating_mul(request.page_size).min(total_count);
            let end = start.saturating_add(request.page_size).min(total_count);
            items[start..end].to_vec()
        }
        _ => Vec::new(),
    };

    Ok(Page {
        items: page_items,
        total_count,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_is_short() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(&items, PageRequest::new(3, 10)).unwrap();
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_count, 25);
    }

    #[test]
    fn test_empty_input_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, PageRequest::first(10)).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_out_of_range_is_empty_not_error() {
        let items: Vec<u32> = (1..=5).collect();
        let page = paginate(&items, PageRequest::new(4, 5)).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);

        let page = paginate(&items, PageRequest::new(0, 5)).unwrap();
        assert!(page.items.is_empty());

        let page = paginate(&items, PageRequest::new(usize::MAX, usize::MAX)).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let items = [1, 2, 3];
        let err = paginate(&items, PageRequest::new(1, 0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPageRequest { page_size: 0 }));
    }

    #[test]
    fn test_exact_multiple() {
        let items: Vec<u32> = (1..=20).collect();
        assert_eq!(page_count(items.len(), 10), 2);
        let page = paginate(&items, PageRequest::new(2, 10)).unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0], 11);
    }
}

//! View composition: filter → sort → paginate
//!
//! The UI keeps only the parameters (`ViewRequest`) as state and calls
//! `build_view` whenever one changes. The order of stages is fixed: sorting
//! before filtering would change which rows land on a requested page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::filter::{filter_with_search, validate_predicates, FilterPredicate, SearchQuery};
use crate::models::{Record, Schema};
use crate::paginate::{paginate, PageRequest};
use crate::sort::{sort, SortSpec};
use crate::stats::{summarize, AggregateResult};
use crate::store::RecordStore;

/// Everything needed to reproduce a view
///
/// Plain data: this is what a bookmark persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
    #[serde(default)]
    pub search: Option<SearchQuery>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

impl ViewRequest {
    pub fn new(page: PageRequest) -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            sort: None,
            page,
        }
    }

    pub fn with_filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn with_search(mut self, search: SearchQuery) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Same parameters, different page
    pub fn at_page(&self, page_index: usize) -> Self {
        Self {
            page: PageRequest::new(page_index, self.page.page_size),
            ..self.clone()
        }
    }
}

/// The slice a table renders, plus the parameters that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub rows: Vec<Arc<Record>>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub applied_filters: Vec<FilterPredicate>,
    pub applied_search: Option<SearchQuery>,
    pub applied_sort: Option<SortSpec>,
}

impl ViewModel {
    /// The request that reproduces this view (for "save as bookmark")
    pub fn applied(&self) -> ViewRequest {
        ViewRequest {
            filters: self.applied_filters.clone(),
            search: self.applied_search.clone(),
            sort: self.applied_sort.clone(),
            page: PageRequest::new(self.page_index, self.page_size),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 1
    }
}

/// Reject sorting on unknown or non-sortable fields when the schema is known
fn validate_sort(schema: &Schema, spec: &SortSpec) -> Result<()> {
    if schema.is_empty() {
        return Ok(());
    }
    match schema.get(&spec.field) {
        None => Err(CoreError::UnknownField {
            field: spec.field.clone(),
        }),
        Some(field) if !field.sortable => Err(CoreError::NotSortable {
            field: spec.field.clone(),
        }),
        Some(_) => Ok(()),
    }
}

/// Filtered and sorted records, no pagination
///
/// This is the export path: a complete extract in display order.
pub fn extract(store: &RecordStore, request: &ViewRequest) -> Result<Vec<Arc<Record>>> {
    validate_predicates(store.schema(), &request.filters)?;
    if let Some(spec) = &request.sort {
        validate_sort(store.schema(), spec)?;
    }

    let filtered = filter_with_search(
        store.records(),
        &request.filters,
        request.search.as_ref(),
    )?;

    Ok(match &request.sort {
        Some(spec) => sort(&filtered, spec),
        None => filtered,
    })
}

/// Build the view for `request` over `store`
///
/// Idempotent: identical arguments give identical output.
///
/// # Errors
/// - `InvalidPredicate` for a bad or unknown filter field
/// - `UnknownField` / `NotSortable` for a bad sort field
/// - `InvalidPageRequest` for a zero page size
pub fn build_view(store: &RecordStore, request: &ViewRequest) -> Result<ViewModel> {
    let ordered = extract(store, request)?;
    let view = view_from_extract(&ordered, request)?;

    debug!(
        store_records = store.len(),
        matched = view.total_count,
        page = view.page_index,
        rows = view.rows.len(),
        "Built view"
    );
    Ok(view)
}

/// Page an extract already produced by `extract` for the same `request`
///
/// Lets a caller that needs the full filtered set anyway (totals, export)
/// render the page without filtering and sorting twice.
pub fn view_from_extract(ordered: &[Arc<Record>], request: &ViewRequest) -> Result<ViewModel> {
    let page = paginate(ordered, request.page)?;

    Ok(ViewModel {
        rows: page.items,
        total_count: page.total_count,
        total_pages: page.total_pages,
        page_index: request.page.page_index,
        page_size: request.page.page_size,
        applied_filters: request.filters.clone(),
        applied_search: request.search.clone(),
        applied_sort: request.sort.clone(),
    })
}

/// Summary widgets for `fields` over the filtered (unpaginated) records
///
/// Reads the filter output only; sorting does not change aggregates.
pub fn build_summary(
    store: &RecordStore,
    request: &ViewRequest,
    fields: &[&str],
) -> Result<BTreeMap<String, AggregateResult>> {
    validate_predicates(store.schema(), &request.filters)?;
    let filtered = filter_with_search(
        store.records(),
        &request.filters,
        request.search.as_ref(),
    )?;

    Ok(fields
        .iter()
        .map(|field| (field.to_string(), summarize(&filtered, field)))
        .collect())
}

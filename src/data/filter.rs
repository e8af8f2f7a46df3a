use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};

use super::error::InvalidFilterError;
use super::metrics::resolution_time_hours;
use super::model::{Dataset, Dimension, ServiceRequest};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive range of calendar dates.  Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// An inverted range is rejected rather than swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidFilterError> {
        if start > end {
            return Err(InvalidFilterError::InvertedDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the timestamp's calendar date lies in the range.  Time of day is ignored.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.contains_date(ts.date())
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ---------------------------------------------------------------------------
// Selection: allowed values for one categorical dimension
// ---------------------------------------------------------------------------

/// Allowed values of one dimension.
///
/// A null cell only passes when `include_null` is set.  An empty selection
/// (no values, no null) rejects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub values: BTreeSet<String>,
    pub include_null: bool,
}

impl Selection {
    /// Select the given values (nulls excluded).
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            values: values.into_iter().map(Into::into).collect(),
            include_null: false,
        }
    }

    /// Every value of `dimension` in the dataset, plus null if it occurs.
    pub fn all(dataset: &Dataset, dimension: Dimension) -> Self {
        Selection {
            values: dataset.values(dimension).map(str::to_string).collect(),
            include_null: dataset.has_nulls.contains(&dimension),
        }
    }

    pub fn with_null(mut self) -> Self {
        self.include_null = true;
        self
    }

    pub fn allows(&self, value: Option<&str>) -> bool {
        match value {
            Some(v) => self.values.contains(v),
            None => self.include_null,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && !self.include_null
    }

    /// Number of selected entries, counting the null sentinel as one.
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.include_null)
    }

    /// Flip a single value in or out of the selection.
    pub fn toggle(&mut self, value: &str) {
        if !self.values.remove(value) {
            self.values.insert(value.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Everything the user has picked in the sidebar.
///
/// Dimensions missing from `categories` are unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date_range: DateRange,
    pub categories: BTreeMap<Dimension, Selection>,
}

impl FilterCriteria {
    /// Restrict by open date only.
    pub fn date_only(date_range: DateRange) -> Self {
        FilterCriteria {
            date_range,
            categories: BTreeMap::new(),
        }
    }

    /// Initialise criteria that pass every row of `dataset`: the full date
    /// span and every status, neighborhood and reason.  `None` when the
    /// dataset is empty.
    pub fn select_all(dataset: &Dataset) -> Option<Self> {
        let (start, end) = dataset.date_bounds()?;
        let mut criteria = FilterCriteria::date_only(DateRange { start, end });
        for dim in [Dimension::CaseStatus, Dimension::Neighborhood, Dimension::Reason] {
            criteria
                .categories
                .insert(dim, Selection::all(dataset, dim));
        }
        Some(criteria)
    }

    /// Builder-style restriction of one dimension.
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.categories.insert(dimension, selection);
        self
    }

    /// Whether any restricted dimension has nothing selected.
    pub fn has_empty_selection(&self) -> bool {
        self.categories.values().any(Selection::is_empty)
    }

    /// Conjunction of the date predicate and every categorical predicate.
    pub fn matches(&self, request: &ServiceRequest) -> bool {
        self.date_range.contains(request.open_dt)
            && self
                .categories
                .iter()
                .all(|(dim, selection)| selection.allows(request.value(*dim)))
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// One row of a [`FilteredView`] with its derived resolution time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRow<'a> {
    /// Position of the row in the source dataset.
    pub index: usize,
    pub request: &'a ServiceRequest,
    pub resolution_time_hours: Option<f64>,
}

/// Rows of a dataset that passed a [`FilterCriteria`], in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<ViewRow<'a>>,
}

impl<'a> FilteredView<'a> {
    /// The whole dataset, unfiltered.
    pub fn all(dataset: &'a Dataset) -> Self {
        collect(dataset.requests.iter().enumerate(), |_| true)
    }

    /// Filter this view again.  The result is a subset of `self`.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredView<'a> {
        filter_rows(self.rows.iter().map(|r| (r.index, r.request)), criteria)
    }

    pub fn rows(&self) -> &[ViewRow<'a>] {
        &self.rows
    }

    pub fn requests(&self) -> impl Iterator<Item = &'a ServiceRequest> + '_ {
        self.rows.iter().map(|r| r.request)
    }

    /// Source-dataset indices of the rows in this view.
    pub fn indices(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.index).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Return the rows of `dataset` that pass all of `criteria`.
pub fn filter<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    let view = filter_rows(dataset.requests.iter().enumerate(), criteria);
    log::debug!("Filter kept {} of {} requests", view.len(), dataset.len());
    view
}

fn filter_rows<'a, I>(rows: I, criteria: &FilterCriteria) -> FilteredView<'a>
where
    I: Iterator<Item = (usize, &'a ServiceRequest)>,
{
    if criteria.has_empty_selection() {
        // Nothing selected for some column → hide everything
        return FilteredView::default();
    }
    collect(rows, |req| criteria.matches(req))
}

fn collect<'a, I, P>(rows: I, mut keep: P) -> FilteredView<'a>
where
    I: Iterator<Item = (usize, &'a ServiceRequest)>,
    P: FnMut(&ServiceRequest) -> bool,
{
    let rows = rows
        .filter(|(_, req)| keep(*req))
        .map(|(index, request)| ViewRow {
            index,
            request,
            resolution_time_hours: resolution_time_hours(request),
        })
        .collect();
    FilteredView { rows }
}

use std::collections::BTreeMap;

use bos311_dashboard::data::error::InvalidFilterError;
use bos311_dashboard::data::filter::{filter, DateRange, FilterCriteria, Selection};
use bos311_dashboard::data::metrics::{
    aggregate, open_date_histogram, value_counts, HistogramBin, Summary,
};
use bos311_dashboard::data::model::{Dataset, Dimension};
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::config::Layout;

/// Buckets in the "Requests Over Time" histogram.
pub const HISTOGRAM_BINS: usize = 30;

/// Dimensions with a sidebar check list in the full dashboard.
pub const FILTER_DIMENSIONS: [Dimension; 3] =
    [Dimension::CaseStatus, Dimension::Neighborhood, Dimension::Reason];

// ---------------------------------------------------------------------------
// Derived data for one filter selection
// ---------------------------------------------------------------------------

/// Everything the central panel draws, recomputed on every filter change.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Source-dataset indices of the visible rows.
    pub indices: Vec<usize>,
    pub summary: Summary,
    pub by_reason: Vec<(String, usize)>,
    pub by_on_time: Vec<(String, usize)>,
    pub by_neighborhood: Vec<(String, usize)>,
    pub histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub layout: Layout,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Dataset>,

    /// Sidebar `(start, end)` open dates.  May be inverted while the user is
    /// editing; `None` until a non-empty dataset is loaded.
    pub dates: Option<(NaiveDate, NaiveDate)>,

    /// Per-dimension check-list selections.
    pub selections: BTreeMap<Dimension, Selection>,

    /// Result of the last [`AppState::refilter`].
    pub snapshot: Snapshot,

    /// Stable chart colours, fixed per dataset.
    pub reason_colors: ColorMap,
    pub on_time_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            dataset: None,
            dates: None,
            selections: BTreeMap::new(),
            snapshot: Snapshot::default(),
            reason_colors: ColorMap::default(),
            on_time_colors: ColorMap::default(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset every filter to "everything".
    pub fn set_dataset(&mut self, dataset: Dataset) {
        match FilterCriteria::select_all(&dataset) {
            Some(criteria) => {
                self.dates = Some((criteria.date_range.start(), criteria.date_range.end()));
                self.selections = criteria.categories;
            }
            None => {
                self.dates = None;
                self.selections = FILTER_DIMENSIONS
                    .into_iter()
                    .map(|d| (d, Selection::default()))
                    .collect();
            }
        }

        self.reason_colors = ColorMap::new(dataset.values(Dimension::Reason));
        self.on_time_colors = ColorMap::new(dataset.values(Dimension::OnTime));

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Build criteria from the sidebar inputs, `None` without a date range.
    pub fn criteria(&self) -> Result<Option<FilterCriteria>, InvalidFilterError> {
        let Some((start, end)) = self.dates else {
            return Ok(None);
        };
        let mut criteria = FilterCriteria::date_only(DateRange::new(start, end)?);
        if self.layout == Layout::Full {
            criteria.categories = self.selections.clone();
        }
        Ok(Some(criteria))
    }

    /// Recompute the view and every aggregate from scratch.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.snapshot = Snapshot::default();
            return;
        };

        let criteria = match self.criteria() {
            Ok(Some(c)) => c,
            Ok(None) => {
                self.snapshot = Snapshot::default();
                return;
            }
            Err(e) => {
                log::warn!("Ignoring filter: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.snapshot = Snapshot::default();
                return;
            }
        };
        self.status_message = None;

        let view = filter(ds, &criteria);
        self.snapshot = Snapshot {
            indices: view.indices(),
            summary: aggregate(&view),
            by_reason: value_counts(&view, Dimension::Reason),
            by_on_time: value_counts(&view, Dimension::OnTime),
            by_neighborhood: value_counts(&view, Dimension::Neighborhood),
            histogram: open_date_histogram(&view, HISTOGRAM_BINS),
        };
    }

    /// Change the open-date range.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.dates = Some((start, end));
        self.refilter();
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_value(&mut self, dimension: Dimension, value: &str) {
        self.selections.entry(dimension).or_default().toggle(value);
        self.refilter();
    }

    /// Toggle whether null cells pass a dimension's filter.
    pub fn toggle_null(&mut self, dimension: Dimension) {
        let selection = self.selections.entry(dimension).or_default();
        selection.include_null = !selection.include_null;
        self.refilter();
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dimension: Dimension) {
        if let Some(ds) = &self.dataset {
            self.selections
                .insert(dimension, Selection::all(ds, dimension));
            self.refilter();
        }
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dimension: Dimension) {
        self.selections.insert(dimension, Selection::default());
        self.refilter();
    }
}

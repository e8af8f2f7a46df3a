use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::error::UnknownDimension;
use super::filter::FilteredView;
use super::model::{Dimension, ServiceRequest};

/// `on_time` value that marks a request resolved within its service window.
pub const ON_TIME: &str = "ONTIME";

/// Hours between opening and closing, `None` while the case is open.
pub fn resolution_time_hours(request: &ServiceRequest) -> Option<f64> {
    let closed = request.closed_dt?;
    let elapsed = closed - request.open_dt;
    Some(elapsed.num_milliseconds() as f64 / 3_600_000.0)
}

// ---------------------------------------------------------------------------
// Scalar aggregates
// ---------------------------------------------------------------------------

/// Headline numbers for a filtered view.
///
/// Undefined quantities (empty view, no resolved rows) are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub total_count: usize,
    pub on_time_count: usize,
    /// Rows with a defined resolution time.
    pub resolved_count: usize,
    /// `on_time_count / total_count`; null `on_time` counts in the denominator.
    pub on_time_fraction: Option<f64>,
    pub avg_resolution_time_hours: Option<f64>,
}

impl Summary {
    /// Percentage with no decimals, e.g. `"50%"`.
    pub fn on_time_percent_label(&self) -> String {
        match self.on_time_fraction {
            Some(f) => format!("{:.0}%", f * 100.0),
            None => "–".to_string(),
        }
    }

    /// Hours with one decimal, e.g. `"24.0"`.
    pub fn avg_resolution_label(&self) -> String {
        match self.avg_resolution_time_hours {
            Some(h) => format!("{h:.1}"),
            None => "–".to_string(),
        }
    }
}

/// Compute total count, on-time fraction and mean resolution time.
pub fn aggregate(view: &FilteredView<'_>) -> Summary {
    let total_count = view.len();
    let mut on_time_count = 0;
    let mut resolved_count = 0;
    let mut resolution_sum = 0.0;

    for row in view.rows() {
        if row.request.on_time.as_deref() == Some(ON_TIME) {
            on_time_count += 1;
        }
        if let Some(hours) = row.resolution_time_hours {
            resolved_count += 1;
            resolution_sum += hours;
        }
    }

    Summary {
        total_count,
        on_time_count,
        resolved_count,
        on_time_fraction: (total_count > 0).then(|| on_time_count as f64 / total_count as f64),
        avg_resolution_time_hours: (resolved_count > 0)
            .then(|| resolution_sum / resolved_count as f64),
    }
}

// ---------------------------------------------------------------------------
// Group-by counts (one per chart)
// ---------------------------------------------------------------------------

/// Rows per value of `dimension`.  Null cells are not counted.
pub fn group_count(view: &FilteredView<'_>, dimension: Dimension) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in view.requests().filter_map(|r| r.value(dimension)) {
        match counts.get_mut(value) {
            Some(n) => *n += 1,
            None => {
                counts.insert(value.to_string(), 1);
            }
        }
    }
    counts
}

/// [`group_count`] keyed by column name, e.g. `"reason"`.
pub fn group_count_by_name(
    view: &FilteredView<'_>,
    column: &str,
) -> Result<BTreeMap<String, usize>, UnknownDimension> {
    Ok(group_count(view, column.parse()?))
}

/// Like [`group_count`] but ordered by count, largest first, ties by value.
pub fn value_counts(view: &FilteredView<'_>, dimension: Dimension) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = group_count(view, dimension).into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Rows per calendar day of `open_dt`.
pub fn counts_by_open_date(view: &FilteredView<'_>) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for req in view.requests() {
        *counts.entry(req.open_date()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Open-date histogram
// ---------------------------------------------------------------------------

/// One equal-width time bucket.  `start` is inclusive; `end` is exclusive
/// except for the last bin, which includes the latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: usize,
}

/// Split the view's `open_dt` span into `bins` equal buckets and count rows.
///
/// Returns no bins for an empty view and a single bin when every request
/// was opened at the same instant.
pub fn open_date_histogram(view: &FilteredView<'_>, bins: usize) -> Vec<HistogramBin> {
    let Some(min) = view.requests().map(|r| r.open_dt).min() else {
        return Vec::new();
    };
    let max = view.requests().map(|r| r.open_dt).max().unwrap_or(min);

    let span_ms = (max - min).num_milliseconds();
    if bins == 0 {
        return Vec::new();
    }
    if span_ms == 0 {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: view.len(),
        }];
    }

    let width_ms = span_ms as f64 / bins as f64;
    let edge = |i: usize| min + Duration::milliseconds((width_ms * i as f64).round() as i64);

    let mut hist: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: edge(i),
            end: if i + 1 == bins { max } else { edge(i + 1) },
            count: 0,
        })
        .collect();

    for req in view.requests() {
        let offset_ms = (req.open_dt - min).num_milliseconds() as f64;
        let idx = ((offset_ms / width_ms) as usize).min(bins - 1);
        hist[idx].count += 1;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, DateRange, FilterCriteria};
    use crate::data::model::Dataset;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn request(
        id: &str,
        open: NaiveDateTime,
        closed: Option<NaiveDateTime>,
        on_time: Option<&str>,
        reason: &str,
    ) -> ServiceRequest {
        ServiceRequest {
            case_enquiry_id: id.to_string(),
            open_dt: open,
            closed_dt: closed,
            case_status: if closed.is_some() { "Closed" } else { "Open" }.to_string(),
            reason: reason.to_string(),
            neighborhood: None,
            on_time: on_time.map(str::to_string),
        }
    }

    /// Trash opened Jan 1 and closed a day later; a Pothole still open.
    fn two_row_table() -> Dataset {
        Dataset::from_requests(vec![
            request("1", ts(1, 0), Some(ts(2, 0)), Some("ONTIME"), "Trash"),
            request("2", ts(5, 0), None, Some("LATE"), "Pothole"),
        ])
    }

    fn criteria(ds: &Dataset, start: NaiveDate, end: NaiveDate) -> FilterCriteria {
        let mut c = FilterCriteria::select_all(ds).unwrap();
        c.date_range = DateRange::new(start, end).unwrap();
        c
    }

    #[test]
    fn full_range_scenario() {
        let ds = two_row_table();
        let view = filter(&ds, &criteria(&ds, date(1), date(10)));
        assert_eq!(view.len(), 2);

        let summary = aggregate(&view);
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.on_time_fraction, Some(0.5));
        assert_eq!(summary.avg_resolution_time_hours, Some(24.0));
        assert_eq!(summary.on_time_percent_label(), "50%");
        assert_eq!(summary.avg_resolution_label(), "24.0");

        let by_reason = group_count_by_name(&view, "reason").unwrap();
        let expected: BTreeMap<String, usize> =
            [("Trash".to_string(), 1), ("Pothole".to_string(), 1)].into();
        assert_eq!(by_reason, expected);
    }

    #[test]
    fn open_only_scenario_has_undefined_average() {
        let ds = two_row_table();
        let view = filter(&ds, &criteria(&ds, date(3), date(10)));
        assert_eq!(view.requests().next().unwrap().case_enquiry_id, "2");

        let summary = aggregate(&view);
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.on_time_fraction, Some(0.0));
        assert_eq!(summary.avg_resolution_time_hours, None);
        assert_eq!(summary.avg_resolution_label(), "–");
    }

    #[test]
    fn empty_view_aggregates_to_zero_and_none() {
        let view = FilteredView::default();
        let summary = aggregate(&view);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.on_time_fraction, None);
        assert_eq!(summary.avg_resolution_time_hours, None);
        assert!(group_count(&view, Dimension::Reason).is_empty());
        assert!(open_date_histogram(&view, 30).is_empty());
    }

    #[test]
    fn null_on_time_counts_in_denominator() {
        let ds = Dataset::from_requests(vec![
            request("1", ts(1, 0), Some(ts(1, 6)), Some("ONTIME"), "Trash"),
            request("2", ts(1, 0), Some(ts(1, 18)), None, "Trash"),
            request("3", ts(2, 0), None, None, "Trash"),
            request("4", ts(2, 0), Some(ts(3, 0)), Some("OVERDUE"), "Trash"),
        ]);
        let summary = aggregate(&FilteredView::all(&ds));
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.on_time_count, 1);
        assert_eq!(summary.on_time_fraction, Some(0.25));
        // (6 + 18 + 24) / 3
        assert_eq!(summary.resolved_count, 3);
        assert_eq!(summary.avg_resolution_time_hours, Some(16.0));
    }

    #[test]
    fn total_count_matches_view_len() {
        let ds = two_row_table();
        for (start, end) in [(1, 1), (1, 4), (2, 5), (6, 9)] {
            let view = filter(&ds, &criteria(&ds, date(start), date(end)));
            assert_eq!(aggregate(&view).total_count, view.len());
        }
    }

    #[test]
    fn resolution_time_has_sub_hour_precision() {
        let mut req = request("1", ts(1, 0), None, None, "Trash");
        assert_eq!(resolution_time_hours(&req), None);
        req.closed_dt = Some(ts(1, 0) + Duration::minutes(90));
        assert_eq!(resolution_time_hours(&req), Some(1.5));
    }

    #[test]
    fn value_counts_orders_by_count_then_name() {
        let ds = Dataset::from_requests(vec![
            request("1", ts(1, 0), None, None, "Trash"),
            request("2", ts(1, 0), None, None, "Graffiti"),
            request("3", ts(1, 0), None, None, "Trash"),
            request("4", ts(1, 0), None, None, "Animal"),
        ]);
        let view = FilteredView::all(&ds);
        assert_eq!(
            value_counts(&view, Dimension::Reason),
            vec![
                ("Trash".to_string(), 2),
                ("Animal".to_string(), 1),
                ("Graffiti".to_string(), 1)
            ]
        );
        assert!(group_count(&view, Dimension::Neighborhood).is_empty());
        assert!(group_count_by_name(&view, "closed_dt").is_err());
    }

    #[test]
    fn histogram_covers_every_row() {
        let ds = Dataset::from_requests(
            (1..=10)
                .map(|d| request(&d.to_string(), ts(d, 12), None, None, "Trash"))
                .collect(),
        );
        let view = FilteredView::all(&ds);
        let hist = open_date_histogram(&view, 3);
        assert_eq!(hist.len(), 3);
        assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), 10);
        assert_eq!(hist[0].start, ts(1, 12));
        assert_eq!(hist[2].end, ts(10, 12));
        // 9-day span → 3-day bins: days 1-3, 4-6, 7-10
        assert_eq!(
            hist.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![3, 3, 4]
        );

        let days = counts_by_open_date(&view);
        assert_eq!(days.len(), 10);
        assert!(days.values().all(|&n| n == 1));
    }

    #[test]
    fn histogram_of_single_instant_is_one_bin() {
        let ds = Dataset::from_requests(vec![
            request("1", ts(4, 8), None, None, "Trash"),
            request("2", ts(4, 8), None, None, "Trash"),
        ]);
        let hist = open_date_histogram(&FilteredView::all(&ds), 30);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].count, 2);
    }
}

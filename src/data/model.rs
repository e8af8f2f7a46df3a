use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::UnknownDimension;

// ---------------------------------------------------------------------------
// Dimension – a categorical column that can be filtered and grouped on
// ---------------------------------------------------------------------------

/// Categorical columns of the service-request table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CaseStatus,
    Reason,
    Neighborhood,
    OnTime,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::CaseStatus,
        Dimension::Reason,
        Dimension::Neighborhood,
        Dimension::OnTime,
    ];

    /// Column name as it appears in the source file.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::CaseStatus => "case_status",
            Dimension::Reason => "reason",
            Dimension::Neighborhood => "neighborhood",
            Dimension::OnTime => "on_time",
        }
    }

    /// Human-readable label for sidebar headers.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::CaseStatus => "Case Status",
            Dimension::Reason => "Reason",
            Dimension::Neighborhood => "Neighborhood",
            Dimension::OnTime => "On Time",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.column_name() == s)
            .ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ServiceRequest – one row of the source table
// ---------------------------------------------------------------------------

/// A single 311 service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub case_enquiry_id: String,
    pub open_dt: NaiveDateTime,
    /// `None` while the case is still open.
    pub closed_dt: Option<NaiveDateTime>,
    pub case_status: String,
    pub reason: String,
    pub neighborhood: Option<String>,
    /// Service-level flag computed upstream, e.g. `ONTIME` / `OVERDUE`.
    pub on_time: Option<String>,
}

impl ServiceRequest {
    /// Value of a categorical column, `None` when the cell is null.
    pub fn value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::CaseStatus => Some(&self.case_status),
            Dimension::Reason => Some(&self.reason),
            Dimension::Neighborhood => self.neighborhood.as_deref(),
            Dimension::OnTime => self.on_time.as_deref(),
        }
    }

    pub fn open_date(&self) -> NaiveDate {
        self.open_dt.date()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded table with pre-computed category indices.
///
/// Never mutated after construction; filtering produces views over it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All requests in file order.
    pub requests: Vec<ServiceRequest>,
    /// For each dimension the sorted set of non-null values.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
    /// Dimensions that contain at least one null cell.
    pub has_nulls: BTreeSet<Dimension>,
}

impl Dataset {
    /// Build category indices from the loaded requests.
    pub fn from_requests(requests: Vec<ServiceRequest>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> =
            Dimension::ALL.into_iter().map(|d| (d, BTreeSet::new())).collect();
        let mut has_nulls = BTreeSet::new();

        for req in &requests {
            for dim in Dimension::ALL {
                match req.value(dim) {
                    Some(v) => {
                        if let Some(set) = unique_values.get_mut(&dim) {
                            if !set.contains(v) {
                                set.insert(v.to_string());
                            }
                        }
                    }
                    None => {
                        has_nulls.insert(dim);
                    }
                }
            }
        }

        Dataset {
            requests,
            unique_values,
            has_nulls,
        }
    }

    /// Sorted non-null values of one dimension.
    pub fn values(&self, dimension: Dimension) -> impl Iterator<Item = &str> {
        self.unique_values
            .get(&dimension)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Earliest and latest open date, `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.requests.iter().map(ServiceRequest::open_date).min()?;
        let max = self.requests.iter().map(ServiceRequest::open_date).max()?;
        Some((min, max))
    }

    /// Number of requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

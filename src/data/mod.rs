//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<ServiceRequest>, category index
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterCriteria → FilteredView (+ resolution time)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  metrics  │  Summary, group counts, open-date histogram
//!   └──────────┘
//! ```
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;

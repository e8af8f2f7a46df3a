//! Filtering and aggregation core for the Boston 311 dashboards.
//!
//! The egui front-end in `main.rs` is a thin consumer of [`data`]: every
//! sidebar change rebuilds a [`data::filter::FilterCriteria`], filters the
//! loaded [`data::model::Dataset`] and recomputes the aggregates.

pub mod data;

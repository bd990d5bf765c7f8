//! District safety analytics.
//!
//! Loads a per-district snapshot of CCTV counts, police facilities, housing prices,
//! population, area and crime totals, then runs two pipelines over it: a
//! gradient-boosted regressor that predicts crime counts, and a random forest that
//! labels districts and probe inputs as safe or unsafe. Results are served over HTTP,
//! printed by the CLI, and exported as Prometheus metrics.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod report;
pub mod telemetry;

pub use error::{AppError, Result};

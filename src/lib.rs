//! Rate uplift engine: applies a percentage or fixed-per-day increase to the
//! daily charge rate of a filtered set of roles and reports the effect on
//! monthly revenue and margin.
//!
//! A typical pass: [`loader::load_table`] → [`schema::resolve`] →
//! [`dataset::Dataset::from_table`] → [`engine::run`].
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod loader;
pub mod margin;
pub mod output;
pub mod reconcile;
pub mod reports;
pub mod schema;
pub mod types;
pub mod uplift;
pub mod util;

pub use dataset::{Dataset, Row};
pub use engine::{run, UpliftOutcome, UpliftScenario};
pub use error::{ConfigError, LoadError};
pub use filter::{partition, FilterSelection, Partition};
pub use margin::{evaluate_margin, MarginReport};
pub use reconcile::{reconcile, MonthlyTotals, Reconciliation};
pub use schema::{resolve, Dimension, Schema};
pub use uplift::{apply_uplift, apply_uplift_with, RevenueModel, UpliftSpec};

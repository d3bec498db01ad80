//! Analytics modules.
//!
//! Validation of raw records, the aggregation engine, and chart series
//! built on top of its results.

pub mod aggregator;
pub mod charts;
pub mod validate;

pub use aggregator::*;
pub use charts::{chart_series, ChartKind, ChartSeries};
pub use validate::{parse_records, AggregationError};

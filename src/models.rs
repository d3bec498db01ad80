//! Data models for the vehicle inventory client.
//!
//! This module contains the core data structures used throughout
//! the application for representing vehicles, analytics results, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::charts::ChartSeries;

/// A single inventory entry as served by the `/vehicle` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Vehicle identification number.
    pub vin: String,
    /// Manufacturer, e.g. "Ford". Empty when the source omitted it.
    pub manufacturer_name: String,
    /// Free-form description.
    pub description: String,
    /// Engine output in horsepower.
    pub horse_power: f64,
    /// Model name, e.g. "Mustang".
    pub model_name: String,
    /// Four-digit model year.
    pub model_year: i32,
    /// Purchase price in the inventory's currency.
    pub purchase_price: f64,
    /// Categorical fuel label, e.g. "gas", "hybrid". Empty when omitted.
    pub fuel_type: String,
}

/// Payload submitted when adding or editing a vehicle.
///
/// Mirrors the add/edit form: every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDraft {
    pub vin: String,
    pub manufacturer_name: String,
    pub description: String,
    pub horse_power: f64,
    pub model_name: String,
    pub model_year: i32,
    pub purchase_price: f64,
    pub fuel_type: String,
}

impl VehicleDraft {
    /// Returns the names of string fields that were left blank.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("vin", &self.vin),
            ("manufacturer_name", &self.manufacturer_name),
            ("description", &self.description),
            ("model_name", &self.model_name),
            ("fuel_type", &self.fuel_type),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Summary statistics computed from a collection of vehicles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Number of records aggregated.
    pub total_count: usize,
    /// Manufacturer with the most records; empty when there are none.
    pub most_common_manufacturer: String,
    /// Mean purchase price, `None` when there is no data.
    pub average_purchase_price: Option<f64>,
    /// Fuel type label to record count.
    pub fuel_type_histogram: BTreeMap<String, usize>,
    /// Manufacturer to mean horsepower.
    pub avg_horsepower_by_manufacturer: BTreeMap<String, f64>,
    /// Model year to mean purchase price.
    pub avg_purchase_price_by_year: BTreeMap<i32, f64>,
}

impl AggregationResult {
    /// Returns true when no records were aggregated.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Where the analyzed collection came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum DataSource {
    /// Fetched from the REST API at this URL.
    Api(String),
    /// Read from a local JSON file.
    File(String),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Api(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "file://{}", path),
        }
    }
}

/// Metadata about the analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Origin of the vehicle collection.
    pub source: DataSource,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Duration of fetch plus aggregation in seconds.
    pub duration_seconds: f64,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    /// Aggregated statistics.
    pub summary: AggregationResult,
    /// Highest-priced vehicles, most expensive first.
    pub most_expensive: Vec<VehicleRecord>,
    /// Chart-ready series derived from `summary`.
    pub charts: Vec<ChartSeries>,
}

//! Chart-ready series derived from aggregation results.
//!
//! Choosing a chart type is purely a rendering decision: every series here
//! is a relabelling of one mapping in [`AggregationResult`], never a
//! recomputation.

use crate::models::AggregationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of chart a series is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Pie => write!(f, "pie"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
        }
    }
}

/// One chart's worth of labels and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    /// Heading shown above the chart.
    pub title: String,
    /// Dataset legend label, if the chart shows one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_label: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// One CSS color per label.
    pub colors: Vec<String>,
}

impl ChartSeries {
    fn new(
        kind: ChartKind,
        title: &str,
        dataset_label: Option<&str>,
        points: Vec<(String, f64)>,
    ) -> Self {
        let (labels, values): (Vec<String>, Vec<f64>) = points.into_iter().unzip();
        Self {
            kind,
            title: title.to_string(),
            dataset_label: dataset_label.map(String::from),
            colors: generate_colors(labels.len()),
            labels,
            values,
        }
    }

    /// Returns true if the series has nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Evenly spaced hues around the color wheel.
pub fn generate_colors(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let hue = (i * 360) as f64 / count as f64;
            format!("hsl({}, 70%, 50%)", hue)
        })
        .collect()
}

/// Build the fuel-type pie, horsepower bar and price-by-year line series.
pub fn chart_series(result: &AggregationResult) -> Vec<ChartSeries> {
    vec![
        ChartSeries::new(
            ChartKind::Pie,
            "Fuel Type Distribution",
            None,
            result
                .fuel_type_histogram
                .iter()
                .map(|(fuel, count)| (fuel.clone(), *count as f64))
                .collect(),
        ),
        ChartSeries::new(
            ChartKind::Bar,
            "Average Horsepower by Manufacturer",
            Some("Average Horsepower"),
            result
                .avg_horsepower_by_manufacturer
                .iter()
                .map(|(name, hp)| (name.clone(), *hp))
                .collect(),
        ),
        ChartSeries::new(
            ChartKind::Line,
            "Average Purchase Price by Year",
            Some("Average Purchase Price by year"),
            result
                .avg_purchase_price_by_year
                .iter()
                .map(|(year, price)| (year.to_string(), *price))
                .collect(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AggregationResult {
        AggregationResult {
            total_count: 3,
            most_common_manufacturer: "Ford".to_string(),
            average_purchase_price: Some(25000.0),
            fuel_type_histogram: [("gas".to_string(), 2), ("hybrid".to_string(), 1)]
                .into_iter()
                .collect(),
            avg_horsepower_by_manufacturer: [("Ford".to_string(), 250.0), ("Toyota".to_string(), 150.0)]
                .into_iter()
                .collect(),
            avg_purchase_price_by_year: [(2020, 22500.0), (2021, 30000.0)].into_iter().collect(),
        }
    }

    #[test]
    fn test_generate_colors() {
        assert_eq!(
            generate_colors(4),
            vec![
                "hsl(0, 70%, 50%)",
                "hsl(90, 70%, 50%)",
                "hsl(180, 70%, 50%)",
                "hsl(270, 70%, 50%)",
            ]
        );
        assert!(generate_colors(0).is_empty());
    }

    #[test]
    fn test_chart_series_shapes() {
        let series = chart_series(&sample_result());

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].kind, ChartKind::Pie);
        assert_eq!(series[0].labels, vec!["gas", "hybrid"]);
        assert_eq!(series[0].values, vec![2.0, 1.0]);
        assert_eq!(series[0].dataset_label, None);

        assert_eq!(series[1].kind, ChartKind::Bar);
        assert_eq!(series[1].values, vec![250.0, 150.0]);
        assert_eq!(series[1].dataset_label.as_deref(), Some("Average Horsepower"));

        assert_eq!(series[2].kind, ChartKind::Line);
        assert_eq!(series[2].labels, vec!["2020", "2021"]);
        assert_eq!(series[2].values, vec![22500.0, 30000.0]);
    }

    #[test]
    fn test_colors_match_labels() {
        for series in chart_series(&sample_result()) {
            assert_eq!(series.colors.len(), series.labels.len());
            assert_eq!(series.values.len(), series.labels.len());
        }
    }

    #[test]
    fn test_empty_result_yields_empty_series() {
        let series = chart_series(&AggregationResult::default());
        assert!(series.iter().all(ChartSeries::is_empty));
    }
}

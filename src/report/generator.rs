//! Report generation.
//!
//! This module renders analytics reports and vehicle listings as plain text,
//! Markdown, or JSON.

use crate::analysis::{manufacturer_ranking, ChartKind, ChartSeries};
use crate::config::ReportFormat;
use crate::models::{AggregationResult, AnalyticsReport, ReportMetadata, VehicleRecord};
use anyhow::Result;
use serde_json::Value;

/// Shown in place of the average price when there are no records.
pub const NO_DATA: &str = "no data";

/// Shown in place of any figure when the records could not be aggregated.
pub const INVALID_DATA: &str = "invalid data";

/// Render a report in the requested format.
pub fn render_report(
    report: &AnalyticsReport,
    format: ReportFormat,
    currency: &str,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report, currency)),
        ReportFormat::Markdown => Ok(generate_markdown_report(report, currency)),
        ReportFormat::Json => generate_json_report(report),
    }
}

/// Format a monetary amount with two decimals, or the no-data marker.
pub fn format_price(amount: Option<f64>, currency: &str) -> String {
    match amount {
        Some(value) => format!("{}{:.2}", currency, value),
        None => NO_DATA.to_string(),
    }
}

fn display_label(label: &str) -> &str {
    if label.is_empty() {
        "(unspecified)"
    } else {
        label
    }
}

/// Generate a plain-text report for the terminal.
pub fn generate_text_report(report: &AnalyticsReport, currency: &str) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();

    lines.push("Vehicle Analytics".to_string());
    lines.push(format!("Source: {}", report.metadata.source));
    lines.push(String::new());
    lines.push(format!("Total Vehicles: {}", summary.total_count));
    lines.push(format!(
        "Most Common Manufacturer: {}",
        if summary.is_empty() {
            NO_DATA
        } else {
            display_label(&summary.most_common_manufacturer)
        }
    ));
    lines.push(format!(
        "Average Purchase Price: {}",
        format_price(summary.average_purchase_price, currency)
    ));

    for chart in &report.charts {
        lines.push(String::new());
        lines.push(format!("{}:", chart.title));
        if chart.is_empty() {
            lines.push(format!("  {}", NO_DATA));
            continue;
        }
        for (label, value) in chart.labels.iter().zip(&chart.values) {
            lines.push(format!(
                "  - {}: {}",
                display_label(label),
                format_value(chart, *value, currency)
            ));
        }
    }

    if !report.most_expensive.is_empty() {
        lines.push(String::new());
        lines.push(format!("Top {} Most Expensive Vehicles:", report.most_expensive.len()));
        for (i, vehicle) in report.most_expensive.iter().enumerate() {
            lines.push(format!(
                "  {}. {} {} - {}",
                i + 1,
                display_label(&vehicle.manufacturer_name),
                vehicle.model_name,
                format_price(Some(vehicle.purchase_price), currency)
            ));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

fn format_value(chart: &ChartSeries, value: f64, currency: &str) -> String {
    match chart.kind {
        ChartKind::Pie => format!("{}", value),
        ChartKind::Bar => format!("{:.1}", value),
        ChartKind::Line => format_price(Some(value), currency),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport, currency: &str) -> String {
    let mut output = String::new();

    output.push_str("# Vehicle Analytics Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, &report.summary));
    output.push_str(&generate_cards_section(&report.summary, currency));

    for chart in &report.charts {
        output.push_str(&generate_chart_section(chart, currency));
    }

    output.push_str(&generate_expensive_section(&report.most_expensive, currency));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, summary: &AggregationResult) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", summary.total_count));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary cards.
fn generate_cards_section(summary: &AggregationResult, currency: &str) -> String {
    let manufacturer = if summary.is_empty() {
        NO_DATA
    } else {
        display_label(&summary.most_common_manufacturer)
    };

    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Total Vehicles | Most Common Manufacturer | Average Purchase Price |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.total_count,
        manufacturer,
        format_price(summary.average_purchase_price, currency)
    ));

    section
}

/// Generate a table for one chart series.
fn generate_chart_section(chart: &ChartSeries, currency: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", chart.title));
    section.push_str(&format!("*Chart: {}*\n\n", chart.kind));

    if chart.is_empty() {
        section.push_str(&format!("_{}_\n\n", NO_DATA));
        return section;
    }

    let heading = chart.dataset_label.as_deref().unwrap_or("Count");
    section.push_str(&format!("| Label | {} |\n", heading));
    section.push_str("|:---|---:|\n");

    for (label, value) in chart.labels.iter().zip(&chart.values) {
        section.push_str(&format!(
            "| {} | {} |\n",
            display_label(label),
            format_value(chart, *value, currency)
        ));
    }
    section.push('\n');

    section
}

/// Generate the most expensive vehicles section.
fn generate_expensive_section(vehicles: &[VehicleRecord], currency: &str) -> String {
    if vehicles.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Most Expensive Vehicles\n\n");
    section.push_str("| # | Manufacturer | Model | Year | Price |\n");
    section.push_str("|:---:|:---|:---|:---:|---:|\n");

    for (i, vehicle) in vehicles.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            display_label(&vehicle.manufacturer_name),
            vehicle.model_name,
            vehicle.model_year,
            format_price(Some(vehicle.purchase_price), currency)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by FleetLens*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Placeholder for a field the API left out or sent as `null`.
const MISSING: &str = "-";

// Listed vehicles are shown as the server sent them, unusable values included,
// so they can be found and edited.
fn cell(vehicle: &Value, field: &str) -> String {
    match vehicle.get(field) {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn price_cell(vehicle: &Value, currency: &str) -> String {
    match vehicle.get("purchase_price") {
        Some(Value::Number(n)) => format!("{}{}", currency, n),
        _ => cell(vehicle, "purchase_price"),
    }
}

/// Render listed vehicles as an aligned text table.
pub fn generate_vehicle_table(vehicles: &[Value], currency: &str) -> String {
    const HEADERS: [&str; 7] = [
        "VIN",
        "Manufacturer",
        "Model",
        "Year",
        "Horsepower",
        "Price",
        "Fuel Type",
    ];

    let rows: Vec<[String; 7]> = vehicles
        .iter()
        .map(|v| {
            [
                cell(v, "vin"),
                cell(v, "manufacturer_name"),
                cell(v, "model_name"),
                cell(v, "model_year"),
                cell(v, "horse_power"),
                price_cell(v, currency),
                cell(v, "fuel_type"),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    lines.push(format_row(&header));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        lines.push(format_row(row));
    }

    lines.join("\n")
}

/// Render one vehicle as labelled lines.
pub fn generate_vehicle_details(vehicle: &Value, currency: &str) -> String {
    [
        format!("VIN:               {}", cell(vehicle, "vin")),
        format!("Manufacturer Name: {}", cell(vehicle, "manufacturer_name")),
        format!("Description:       {}", cell(vehicle, "description")),
        format!("Horse Power:       {}", cell(vehicle, "horse_power")),
        format!("Model Name:        {}", cell(vehicle, "model_name")),
        format!("Model Year:        {}", cell(vehicle, "model_year")),
        format!("Purchase Price:    {}", price_cell(vehicle, currency)),
        format!("Fuel Type:         {}", cell(vehicle, "fuel_type")),
    ]
    .join("\n")
}

/// Short manufacturer breakdown for log output.
pub fn manufacturer_summary(vehicles: &[Value]) -> String {
    let names = vehicles.iter().map(|v| {
        v.get("manufacturer_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    });

    manufacturer_ranking(names)
        .into_iter()
        .map(|(name, count)| format!("{} ({})", display_label(&name), count))
        .collect::<Vec<_>>()
        .join(", ")
}

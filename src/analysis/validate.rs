//! Record validation at the aggregation boundary.
//!
//! Raw payloads from the API (or a local export) are converted into
//! [`VehicleRecord`]s here. Anything that would poison an average is
//! rejected with a typed error instead of being coerced into `NaN`.

use crate::models::VehicleRecord;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while validating or aggregating vehicle records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// A record is missing a required field or carries an unusable value.
    #[error("malformed record #{index} (vin {vin:?}): field `{field}` {reason}")]
    MalformedRecord {
        index: usize,
        vin: String,
        field: &'static str,
        reason: String,
    },

    /// An element of the collection is not a JSON object.
    #[error("malformed record #{index}: expected an object, found {found}")]
    NotAnObject { index: usize, found: &'static str },

    /// Summing a group's values left the finite range.
    #[error("{field} total for {group} overflowed while aggregating")]
    Overflow { field: &'static str, group: String },
}

impl AggregationError {
    fn malformed(index: usize, vin: &str, field: &'static str, reason: impl Into<String>) -> Self {
        AggregationError::MalformedRecord {
            index,
            vin: vin.to_string(),
            field,
            reason: reason.into(),
        }
    }
}

/// Convert a raw JSON collection into validated records.
///
/// Fails on the first malformed element; no partial result is returned.
pub fn parse_records(values: &[Value]) -> Result<Vec<VehicleRecord>, AggregationError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| parse_record(index, value))
        .collect()
}

/// Convert a single JSON value into a record.
pub fn parse_record(index: usize, value: &Value) -> Result<VehicleRecord, AggregationError> {
    let object = value.as_object().ok_or(AggregationError::NotAnObject {
        index,
        found: json_kind(value),
    })?;

    let vin = match object.get("vin") {
        Some(Value::String(vin)) if !vin.trim().is_empty() => vin.clone(),
        Some(Value::String(_)) => {
            return Err(AggregationError::malformed(index, "", "vin", "is empty"))
        }
        Some(Value::Null) | None => {
            return Err(AggregationError::malformed(index, "", "vin", "is missing"))
        }
        Some(other) => {
            return Err(AggregationError::malformed(
                index,
                "",
                "vin",
                format!("must be a string, found {}", json_kind(other)),
            ))
        }
    };

    Ok(VehicleRecord {
        manufacturer_name: optional_string(object, index, &vin, "manufacturer_name")?,
        description: optional_string(object, index, &vin, "description")?,
        horse_power: required_number(object, index, &vin, "horse_power")?,
        model_name: optional_string(object, index, &vin, "model_name")?,
        model_year: required_year(object, index, &vin)?,
        purchase_price: required_number(object, index, &vin, "purchase_price")?,
        fuel_type: optional_string(object, index, &vin, "fuel_type")?,
        vin,
    })
}

/// Check the numeric fields of an already-typed record.
pub fn check_record(index: usize, record: &VehicleRecord) -> Result<(), AggregationError> {
    check_amount(index, &record.vin, "horse_power", record.horse_power)?;
    check_amount(index, &record.vin, "purchase_price", record.purchase_price)?;
    Ok(())
}

fn check_amount(
    index: usize,
    vin: &str,
    field: &'static str,
    value: f64,
) -> Result<f64, AggregationError> {
    if !value.is_finite() {
        return Err(AggregationError::malformed(
            index,
            vin,
            field,
            "is not a finite number",
        ));
    }
    if value < 0.0 {
        return Err(AggregationError::malformed(
            index,
            vin,
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    Ok(value)
}

// Missing and null categorical fields count as the empty-string category.
fn optional_string(
    object: &Map<String, Value>,
    index: usize,
    vin: &str,
    field: &'static str,
) -> Result<String, AggregationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(AggregationError::malformed(
            index,
            vin,
            field,
            format!("must be a string, found {}", json_kind(other)),
        )),
    }
}

fn required_number(
    object: &Map<String, Value>,
    index: usize,
    vin: &str,
    field: &'static str,
) -> Result<f64, AggregationError> {
    let value = match object.get(field) {
        None | Some(Value::Null) => {
            return Err(AggregationError::malformed(index, vin, field, "is missing"))
        }
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AggregationError::malformed(index, vin, field, "is out of range"))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            AggregationError::malformed(index, vin, field, format!("is not numeric: {:?}", s))
        })?,
        Some(other) => {
            return Err(AggregationError::malformed(
                index,
                vin,
                field,
                format!("must be a number, found {}", json_kind(other)),
            ))
        }
    };

    check_amount(index, vin, field, value)
}

fn required_year(
    object: &Map<String, Value>,
    index: usize,
    vin: &str,
) -> Result<i32, AggregationError> {
    const FIELD: &str = "model_year";

    let parsed = match object.get(FIELD) {
        None | Some(Value::Null) => {
            return Err(AggregationError::malformed(index, vin, FIELD, "is missing"))
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(other) => {
            return Err(AggregationError::malformed(
                index,
                vin,
                FIELD,
                format!("must be a year, found {}", json_kind(other)),
            ))
        }
    };

    parsed
        .and_then(|year| i32::try_from(year).ok())
        .ok_or_else(|| AggregationError::malformed(index, vin, FIELD, "is not an integer year"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

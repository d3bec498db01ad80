//! Vehicle aggregation and statistics.
//!
//! This module turns a collection of vehicle records into the summary
//! statistics shown on the analytics view.

use crate::analysis::validate::{check_record, AggregationError};
use crate::models::{AggregationResult, VehicleRecord};
use std::collections::{BTreeMap, HashMap};

/// Running sum and count for one group.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(mut self, value: f64) -> Self {
        self.sum += value;
        self.count += 1;
        self
    }

    /// Mean of the group, or an overflow error once the sum has left the finite range.
    fn value(
        &self,
        field: &'static str,
        group: impl FnOnce() -> String,
    ) -> Result<f64, AggregationError> {
        if !self.sum.is_finite() {
            return Err(AggregationError::Overflow {
                field,
                group: group(),
            });
        }
        Ok(self.sum / self.count as f64)
    }
}

/// Accumulated state of a single pass over the records.
#[derive(Debug, Default)]
struct Tally {
    price: Mean,
    // manufacturer -> (records seen, index of first record)
    manufacturers: HashMap<String, (usize, usize)>,
    fuel_types: BTreeMap<String, usize>,
    horse_power: BTreeMap<String, Mean>,
    price_by_year: BTreeMap<i32, Mean>,
}

impl Tally {
    fn push(mut self, index: usize, vehicle: &VehicleRecord) -> Self {
        self.price = self.price.add(vehicle.purchase_price);

        self.manufacturers
            .entry(vehicle.manufacturer_name.clone())
            .or_insert((0, index))
            .0 += 1;

        *self
            .fuel_types
            .entry(vehicle.fuel_type.clone())
            .or_default() += 1;

        let hp = self
            .horse_power
            .entry(vehicle.manufacturer_name.clone())
            .or_default();
        *hp = hp.add(vehicle.horse_power);

        let year = self.price_by_year.entry(vehicle.model_year).or_default();
        *year = year.add(vehicle.purchase_price);

        self
    }

    fn finish(self) -> Result<AggregationResult, AggregationError> {
        // Highest count wins; among equal counts the earliest first appearance wins.
        let most_common_manufacturer = self
            .manufacturers
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|(name, _)| name)
            .unwrap_or_default();

        let average_purchase_price = if self.price.count > 0 {
            Some(self.price.value("purchase_price", || "all vehicles".to_string())?)
        } else {
            None
        };

        let avg_horsepower_by_manufacturer = self
            .horse_power
            .into_iter()
            .map(|(name, mean)| {
                let avg = mean.value("horse_power", || format!("manufacturer {:?}", name));
                avg.map(|avg| (name, avg))
            })
            .collect::<Result<_, AggregationError>>()?;

        let avg_purchase_price_by_year = self
            .price_by_year
            .into_iter()
            .map(|(year, mean)| {
                let avg = mean.value("purchase_price", || format!("model year {}", year));
                avg.map(|avg| (year, avg))
            })
            .collect::<Result<_, AggregationError>>()?;

        Ok(AggregationResult {
            total_count: self.price.count,
            most_common_manufacturer,
            average_purchase_price,
            fuel_type_histogram: self.fuel_types,
            avg_horsepower_by_manufacturer,
            avg_purchase_price_by_year,
        })
    }
}

/// Compute summary statistics for a collection of vehicles.
///
/// Every record is checked before anything is accumulated; the first record
/// with a non-finite or negative amount aborts the call, and so does a sum
/// that overflows. An empty collection is not an error and yields a zero
/// count with no average price.
pub fn aggregate(vehicles: &[VehicleRecord]) -> Result<AggregationResult, AggregationError> {
    for (index, vehicle) in vehicles.iter().enumerate() {
        check_record(index, vehicle)?;
    }

    vehicles
        .iter()
        .enumerate()
        .fold(Tally::default(), |tally, (index, vehicle)| {
            tally.push(index, vehicle)
        })
        .finish()
}

/// Get the `n` most expensive vehicles, highest price first.
///
/// Vehicles with equal prices keep their input order.
pub fn most_expensive(vehicles: &[VehicleRecord], n: usize) -> Vec<VehicleRecord> {
    let mut sorted: Vec<VehicleRecord> = vehicles.to_vec();
    sorted.sort_by(|a, b| {
        b.purchase_price
            .partial_cmp(&a.purchase_price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

/// Count records per manufacturer, most frequent first.
///
/// Manufacturers with equal counts keep the order in which they first appear.
pub fn manufacturer_ranking<'a, I>(names: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    // manufacturer -> (records seen, index of first record)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, name) in names.into_iter().enumerate() {
        counts.entry(name).or_insert((0, index)).0 += 1;
    }

    let mut ranking: Vec<_> = counts.into_iter().collect();
    ranking.sort_by_key(|(_, (count, first))| (std::cmp::Reverse(*count), *first));
    ranking
        .into_iter()
        .map(|(name, (count, _))| (name.to_string(), count))
        .collect()
}

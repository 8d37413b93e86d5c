//! Per-district counts and headline totals across both kinds.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::records::{Coordinates, ServiceRecord};

/// Counts for one district, zero-filled when a kind has no records there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCounts {
    pub ambulance_count: usize,
    pub fire_station_count: usize,
}

impl DistrictCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.ambulance_count + self.fire_station_count
    }
}

/// District name → counts, ordered by district name.
pub type DistrictSummary = BTreeMap<String, DistrictCounts>;

/// Scalar figures shown on the dashboard's metric cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub ambulance_total: usize,
    pub fire_station_total: usize,
    /// Distinct non-empty districts among ambulance depots.
    pub ambulance_districts: usize,
    /// Distinct non-empty districts among fire stations.
    pub fire_station_districts: usize,
    /// Distinct non-empty districts across both kinds.
    pub distinct_districts: usize,
    /// Sum of both totals; only present when both sets are non-empty.
    pub combined_total: Option<usize>,
    /// Mean position of ambulance depots that have coordinates.
    pub ambulance_centroid: Option<Coordinates>,
    /// Mean position of fire stations that have coordinates.
    pub fire_station_centroid: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub districts: DistrictSummary,
    pub totals: SummaryTotals,
}

/// Outer-joins both record sets on district and computes the totals.
///
/// Records with an empty district contribute to the totals but get no
/// district row.
#[must_use]
pub fn summarize(ambulance: &[ServiceRecord], fire_stations: &[ServiceRecord]) -> ServiceSummary {
    let mut districts = DistrictSummary::new();

    for record in ambulance.iter().filter(|r| !r.district.is_empty()) {
        districts
            .entry(record.district.clone())
            .or_default()
            .ambulance_count += 1;
    }
    for record in fire_stations.iter().filter(|r| !r.district.is_empty()) {
        districts
            .entry(record.district.clone())
            .or_default()
            .fire_station_count += 1;
    }

    let ambulance_total = ambulance.len();
    let fire_station_total = fire_stations.len();
    let combined_total = (ambulance_total > 0 && fire_station_total > 0)
        .then_some(ambulance_total + fire_station_total);

    let totals = SummaryTotals {
        ambulance_total,
        fire_station_total,
        ambulance_districts: distinct_districts(ambulance),
        fire_station_districts: distinct_districts(fire_stations),
        distinct_districts: districts.len(),
        combined_total,
        ambulance_centroid: centroid(ambulance),
        fire_station_centroid: centroid(fire_stations),
    };

    ServiceSummary { districts, totals }
}

fn distinct_districts(records: &[ServiceRecord]) -> usize {
    records
        .iter()
        .filter(|r| !r.district.is_empty())
        .map(|r| r.district.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

#[allow(clippy::cast_precision_loss)]
fn centroid(records: &[ServiceRecord]) -> Option<Coordinates> {
    let (count, lat_sum, lon_sum) = records
        .iter()
        .filter_map(ServiceRecord::coordinates)
        .fold((0usize, 0.0_f64, 0.0_f64), |(n, lat, lon), c| {
            (n + 1, lat + c.latitude, lon + c.longitude)
        });
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Coordinates::new(lat_sum / n, lon_sum / n)
}

//! Normalization from raw GeoJSON features to [`fsdash_core::ServiceRecord`].
//!
//! Missing text becomes an empty string and missing coordinates become
//! `None`; nothing here fails the batch. Which incomplete records survive is
//! decided by the configured [`Stringency`].

use std::collections::HashSet;

use fsdash_core::{Coordinates, ServiceKind, ServiceRecord, Stringency};
use serde_json::Value;

use crate::types::{keys, Feature, FeatureCollection};

/// Why a feature did not become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    MalformedFeature,
    MissingId,
    DuplicateId,
    MissingNameOrDistrict,
    MissingCoordinates,
}

#[derive(Debug, Default)]
struct DropTally {
    malformed_feature: usize,
    missing_id: usize,
    duplicate_id: usize,
    missing_name_or_district: usize,
    missing_coordinates: usize,
}

impl DropTally {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MalformedFeature => self.malformed_feature += 1,
            DropReason::MissingId => self.missing_id += 1,
            DropReason::DuplicateId => self.duplicate_id += 1,
            DropReason::MissingNameOrDistrict => self.missing_name_or_district += 1,
            DropReason::MissingCoordinates => self.missing_coordinates += 1,
        }
    }

    fn total(&self) -> usize {
        self.malformed_feature
            + self.missing_id
            + self.duplicate_id
            + self.missing_name_or_district
            + self.missing_coordinates
    }
}

/// Flattens every feature of `collection` into a [`ServiceRecord`] tagged
/// with `kind`, preserving source order.
///
/// A feature is dropped when it is not a feature object at all, when it has
/// no integer `OBJECTID`, when it repeats
/// an id already seen in this collection, or when `stringency` rejects it.
#[must_use]
pub fn normalize_collection(
    collection: FeatureCollection,
    kind: ServiceKind,
    stringency: Stringency,
) -> Vec<ServiceRecord> {
    let input_count = collection.features.len();
    let mut seen_ids = HashSet::with_capacity(input_count);
    let mut tally = DropTally::default();
    let mut records = Vec::with_capacity(input_count);

    for value in &collection.features {
        let feature = match Feature::from_value(value) {
            Ok(feature) => feature,
            Err(e) => {
                tracing::debug!(%kind, error = %e, "skipping malformed feature");
                tally.record(DropReason::MalformedFeature);
                continue;
            }
        };
        match normalize_feature(&feature, kind) {
            Some(record) => {
                if let Some(reason) = rejection(&record, stringency) {
                    tally.record(reason);
                } else if !seen_ids.insert(record.id) {
                    tracing::warn!(%kind, id = record.id, "duplicate OBJECTID in feed; keeping first");
                    tally.record(DropReason::DuplicateId);
                } else {
                    records.push(record);
                }
            }
            None => tally.record(DropReason::MissingId),
        }
    }

    if tally.total() > 0 {
        tracing::info!(
            %kind,
            %stringency,
            input = input_count,
            kept = records.len(),
            malformed_feature = tally.malformed_feature,
            missing_id = tally.missing_id,
            duplicate_id = tally.duplicate_id,
            missing_name_or_district = tally.missing_name_or_district,
            missing_coordinates = tally.missing_coordinates,
            "dropped incomplete features during normalization"
        );
    } else {
        tracing::debug!(%kind, kept = records.len(), "normalized feed");
    }

    records
}

/// Maps one feature to a record. Returns `None` only when the feature has no
/// usable `OBJECTID`.
#[must_use]
pub fn normalize_feature(feature: &Feature, kind: ServiceKind) -> Option<ServiceRecord> {
    let id = feature.property(keys::OBJECT_ID).and_then(integer_value)?;

    let latitude = feature.property(keys::LATITUDE).and_then(number_value);
    let longitude = feature.property(keys::LONGITUDE).and_then(number_value);
    // Keep the pair only if it forms a valid position; a lone or
    // out-of-range value would put a pin in the wrong place.
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) if Coordinates::new(lat, lon).is_some() => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    Some(ServiceRecord {
        id,
        agency_code: text(feature, keys::AGENCY_CODE),
        name: text(feature, keys::NAME),
        name_en: text(feature, keys::NAME_EN),
        address: text(feature, keys::ADDRESS),
        address_en: text(feature, keys::ADDRESS_EN),
        district: text(feature, keys::DISTRICT),
        district_en: text(feature, keys::DISTRICT_EN),
        phone: text(feature, keys::TELEPHONE),
        latitude,
        longitude,
        kind,
    })
}

fn rejection(record: &ServiceRecord, stringency: Stringency) -> Option<DropReason> {
    if stringency.requires_name_and_district()
        && (record.name.is_empty() || record.district.is_empty())
    {
        return Some(DropReason::MissingNameOrDistrict);
    }
    if stringency.requires_coordinates() && !record.has_coordinates() {
        return Some(DropReason::MissingCoordinates);
    }
    None
}

/// Renders a property as trimmed text. Numbers and booleans are stringified;
/// arrays and objects are treated as absent.
fn text(feature: &Feature, key: &str) -> String {
    match feature.property(key) {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

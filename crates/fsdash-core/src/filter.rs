//! Search and district filtering over normalized record sets.
//!
//! Everything here is pure: inputs are borrowed, outputs are new vectors, and
//! the source set is never touched. The same predicate is applied
//! independently to each kind's records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::records::{Coordinates, ServiceKind, ServiceRecord};

/// User-supplied filter from the search box and the district multi-select.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Case-insensitive substring matched against name or address.
    /// `None` or an empty string matches everything.
    pub search: Option<String>,
    /// Exact district names, OR-ed together. Empty matches everything.
    #[serde(default)]
    pub districts: BTreeSet<String>,
}

impl FilterPredicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_districts<I, S>(mut self, districts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.districts.extend(districts.into_iter().map(Into::into));
        self
    }

    /// `true` when the predicate lets every record through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.districts.is_empty()
    }

    /// Lowercased search text, or `None` when there is nothing to match.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches_with(&self, record: &ServiceRecord, needle: Option<&str>) -> bool {
        let search_ok = needle.is_none_or(|needle| {
            record.name.to_lowercase().contains(needle)
                || record.address.to_lowercase().contains(needle)
        });
        let district_ok =
            self.districts.is_empty() || self.districts.contains(record.district.as_str());
        search_ok && district_ok
    }

    /// Tests a single record against both conditions.
    #[must_use]
    pub fn matches(&self, record: &ServiceRecord) -> bool {
        self.matches_with(record, self.needle().as_deref())
    }
}

/// Returns the records that satisfy `predicate`, in their original order.
#[must_use]
pub fn apply_filter(records: &[ServiceRecord], predicate: &FilterPredicate) -> Vec<ServiceRecord> {
    let needle = predicate.needle();
    records
        .iter()
        .filter(|r| predicate.matches_with(r, needle.as_deref()))
        .cloned()
        .collect()
}

/// Sorted, de-duplicated, non-empty district names present in `records`.
///
/// These are the choices offered by the district multi-select.
#[must_use]
pub fn district_options(records: &[ServiceRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.district.is_empty())
        .map(|r| r.district.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A record reduced to what a map marker needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPin {
    pub id: i64,
    pub kind: ServiceKind,
    pub name: String,
    pub address: String,
    pub district: String,
    pub phone: String,
    pub agency_code: String,
    #[serde(flatten)]
    pub position: Coordinates,
}

/// Map markers for every record that has usable coordinates.
///
/// Records without coordinates are skipped silently; they remain visible in
/// tabular views.
#[must_use]
pub fn map_pins(records: &[ServiceRecord]) -> Vec<MapPin> {
    records
        .iter()
        .filter_map(|r| {
            let position = r.coordinates()?;
            Some(MapPin {
                id: r.id,
                kind: r.kind,
                name: r.name.clone(),
                address: r.address.clone(),
                district: r.district.clone(),
                phone: r.phone.clone(),
                agency_code: r.agency_code.clone(),
                position,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Which upstream feed a record came from.
///
/// The tag is assigned by the feed that produced the record; it never
/// appears in the source data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    AmbulanceDepot,
    FireStation,
}

impl ServiceKind {
    /// Both kinds, in display order.
    pub const ALL: [ServiceKind; 2] = [ServiceKind::AmbulanceDepot, ServiceKind::FireStation];

    /// Stable machine-readable name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::AmbulanceDepot => "ambulance_depot",
            ServiceKind::FireStation => "fire_station",
        }
    }

    /// Human-readable plural label, e.g. for table headings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ServiceKind::AmbulanceDepot => "Ambulance depots",
            ServiceKind::FireStation => "Fire stations",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = CoreError;

    /// Accepts the serde names plus the short and hyphenated forms used in
    /// URLs and on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ambulance_depot" | "ambulance-depot" | "ambulance-depots" | "ambulance" => {
                Ok(ServiceKind::AmbulanceDepot)
            }
            "fire_station" | "fire-station" | "fire-stations" | "fire" => {
                Ok(ServiceKind::FireStation)
            }
            _ => Err(CoreError::UnknownKind(s.to_owned())),
        }
    }
}

/// A validated latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `Some` only when both values are finite and in range.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// One ambulance depot or fire station, flattened from a GeoJSON feature.
///
/// Text fields are empty strings when the source omits them. Coordinates are
/// `None` when absent or unusable; such records still belong in tables and
/// are only left off the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Source `OBJECTID`; unique within one kind's record set per fetch.
    pub id: i64,
    /// Fire Services Department identifier (`FSDID`).
    pub agency_code: String,
    pub name: String,
    pub name_en: String,
    pub address: String,
    pub address_en: String,
    /// Grouping key for filters and aggregates. Opaque text.
    pub district: String,
    pub district_en: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub kind: ServiceKind,
}

impl ServiceRecord {
    /// The record's position, if it can be placed on a map.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// How aggressively the normalizer drops incomplete records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stringency {
    /// Keep every record that carries an id.
    Lenient,
    /// Drop records with an empty name or district.
    #[default]
    Standard,
    /// As `Standard`, and also drop records without coordinates.
    Strict,
}

impl Stringency {
    #[must_use]
    pub fn requires_name_and_district(self) -> bool {
        matches!(self, Stringency::Standard | Stringency::Strict)
    }

    #[must_use]
    pub fn requires_coordinates(self) -> bool {
        matches!(self, Stringency::Strict)
    }
}

impl fmt::Display for Stringency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stringency::Lenient => write!(f, "lenient"),
            Stringency::Standard => write!(f, "standard"),
            Stringency::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for Stringency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(Stringency::Lenient),
            "standard" => Ok(Stringency::Standard),
            "strict" => Ok(Stringency::Strict),
            other => Err(CoreError::UnknownStringency(other.to_owned())),
        }
    }
}

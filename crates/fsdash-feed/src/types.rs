//! Raw GeoJSON shapes returned by the CSDI WFS `GetFeature` endpoints.
//!
//! ## Observed shape
//!
//! The response is a GeoJSON `FeatureCollection`. Each feature carries a flat
//! `properties` object keyed by the ArcGIS field names:
//! `OBJECTID`, `FSDID`, `Name_TC`, `Name_ENG`, `Address_TC`, `Address_ENG`,
//! `District_TC`, `District_ENG`, `Telephone`, `Latitude`, `Longitude`, and
//! the grid references `Northing` / `Easting`, which are not used.
//!
//! Values are not reliably typed: `Telephone` and `FSDID` may arrive as
//! numbers, coordinates occasionally as strings, and any key may be absent
//! or `null`. Properties are therefore kept as raw JSON and interpreted in
//! `normalize.rs`. Individual entries of `features` stay untyped until then,
//! so one broken feature cannot fail the whole collection.
//!
//! The geometry is ignored. Its coordinate reference system depends on the
//! server configuration, so positions are taken from the `Latitude` /
//! `Longitude` properties instead.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Top-level `FeatureCollection`. A body without a `features` array fails
/// to deserialize and is reported as a malformed response; the elements
/// themselves are checked one at a time by [`Feature::from_value`].
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    /// Property bag. Missing or `null` properties behave like an empty object.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Interprets one element of `features`.
    ///
    /// # Errors
    ///
    /// Fails when the element is not an object or its `properties` is
    /// neither an object nor `null`.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Feature::deserialize(value)
    }

    /// Looks up a property, treating JSON `null` as absent.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(key))
            .filter(|v| !v.is_null())
    }
}

/// Source property keys.
pub mod keys {
    pub const OBJECT_ID: &str = "OBJECTID";
    pub const AGENCY_CODE: &str = "FSDID";
    pub const NAME: &str = "Name_TC";
    pub const NAME_EN: &str = "Name_ENG";
    pub const ADDRESS: &str = "Address_TC";
    pub const ADDRESS_EN: &str = "Address_ENG";
    pub const DISTRICT: &str = "District_TC";
    pub const DISTRICT_EN: &str = "District_ENG";
    pub const TELEPHONE: &str = "Telephone";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
}

//! Record and RecordPoint - the canonical telemetry unit
//!
//! A `Record` is created once by a translator from a raw payload plus
//! scheduling metadata, and is treated as immutable once handed to the
//! engine. Metadata keys matching known record fields seed those fields
//! directly; all other keys land in the open `meta` extension map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::DeviceType;

/// Open string-keyed extension map carried by records and requesters.
pub type MetaMap = BTreeMap<String, serde_json::Value>;

/// A single reading with a canonical physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPoint {
    /// Point index as reported by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Human readable point name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Canonical physical unit, always present
    #[serde(default = "dimensionless")]
    pub unit: String,

    /// Reading value; `None` when unreadable or unconvertible
    pub value: Option<f64>,
}

fn dimensionless() -> String {
    "dimensionless".to_string()
}

impl RecordPoint {
    /// An empty point used when a required field cannot be derived.
    pub fn null() -> Self {
        Self {
            index: None,
            name: None,
            unit: dimensionless(),
            value: None,
        }
    }
}

impl Default for RecordPoint {
    fn default() -> Self {
        Self::null()
    }
}

/// Device geolocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinates {
    /// Longitude in degrees
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    /// Latitude in degrees
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self { lon: 0.0, lat: 0.0 }
    }
}

/// Canonical, unit-normalized telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Record {
    /// Primary name of the device (dedup key in rate-limited sinks)
    #[validate(length(min = 1))]
    pub name: String,

    /// Human readable device name taken from the payload
    #[validate(length(min = 1))]
    pub device_name: String,

    /// Device type tag selecting the required-field table
    #[serde(rename = "type")]
    pub device_type: DeviceType,

    /// Creation unix timestamp (seconds)
    #[validate(range(min = 1))]
    pub timestamp: i64,

    /// Time to live in seconds
    #[validate(range(min = 1))]
    pub ttl: i64,

    /// Device geolocation
    #[validate(nested)]
    pub coord: Coordinates,

    /// Raw readings keyed by point index
    #[validate(custom(function = "validate_point_units"))]
    pub data: BTreeMap<u32, RecordPoint>,

    /// Enriched readings keyed by canonical field name
    #[validate(custom(function = "validate_parsed_units"))]
    pub parsed: BTreeMap<String, RecordPoint>,

    /// Open extension map for unrecognized metadata keys
    #[serde(default)]
    pub meta: MetaMap,
}

fn validate_point_units(points: &BTreeMap<u32, RecordPoint>) -> Result<(), ValidationError> {
    if points.values().any(|p| p.unit.is_empty()) {
        return Err(ValidationError::new("point_unit_missing"));
    }
    Ok(())
}

fn validate_parsed_units(points: &BTreeMap<String, RecordPoint>) -> Result<(), ValidationError> {
    if points.values().any(|p| p.unit.is_empty()) {
        return Err(ValidationError::new("parsed_unit_missing"));
    }
    Ok(())
}

impl Record {
    /// Seed a record from free-form request metadata.
    ///
    /// Known keys (`name`, `lon`, `lat`, `ttl`, `type`) populate the matching
    /// fields; `parsed` is reserved for enrichment directives and consumed by
    /// the translator; everything else is kept verbatim in `meta`. The device
    /// type defaults to `UNKNOWN` until the translator resolves the tag.
    pub fn from_meta(meta: &MetaMap) -> Self {
        let mut record = Self {
            name: String::new(),
            device_name: String::new(),
            device_type: DeviceType::Unknown,
            timestamp: 0,
            ttl: 0,
            coord: Coordinates::default(),
            data: BTreeMap::new(),
            parsed: BTreeMap::new(),
            meta: MetaMap::new(),
        };

        for (key, value) in meta {
            match key.as_str() {
                "name" => {
                    if let Some(s) = value.as_str() {
                        record.name = s.to_string();
                    }
                }
                "lon" => {
                    if let Some(v) = value.as_f64() {
                        record.coord.lon = v;
                    }
                }
                "lat" => {
                    if let Some(v) = value.as_f64() {
                        record.coord.lat = v;
                    }
                }
                "ttl" => {
                    if let Some(v) = value.as_i64() {
                        record.ttl = v;
                    }
                }
                // resolved by the translator against the device-type table
                "type" | "parsed" => {}
                _ => {
                    record.meta.insert(key.clone(), value.clone());
                }
            }
        }

        record
    }

    /// The device-type tag supplied in request metadata, if any.
    pub fn meta_device_tag(meta: &MetaMap) -> Option<String> {
        meta.get("type")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Schema validation: required fields present and well typed.
    ///
    /// Deterministic and idempotent for an unchanged record.
    pub fn is_valid(&self) -> bool {
        Validate::validate(self).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta_fixture() -> MetaMap {
        let mut meta = MetaMap::new();
        meta.insert("name".into(), json!("broyhill_wind"));
        meta.insert("lon".into(), json!(-81.6861));
        meta.insert("lat".into(), json!(36.2168));
        meta.insert("ttl".into(), json!(300));
        meta.insert("type".into(), json!("WIND"));
        meta.insert("campus".into(), json!("appalachian"));
        meta.insert("parsed".into(), json!({"rotor_speed": {"point": 10}}));
        meta
    }

    fn valid_record() -> Record {
        let mut record = Record::from_meta(&meta_fixture());
        record.device_name = "Broyhill Wind Turbine".into();
        record.device_type = DeviceType::Wind;
        record.timestamp = 1_487_952_382;
        record
    }

    #[test]
    fn from_meta_seeds_known_fields() {
        let record = Record::from_meta(&meta_fixture());
        assert_eq!(record.name, "broyhill_wind");
        assert_eq!(record.ttl, 300);
        assert!((record.coord.lon - -81.6861).abs() < 1e-9);
        assert!((record.coord.lat - 36.2168).abs() < 1e-9);
    }

    #[test]
    fn from_meta_routes_unknown_keys_to_meta() {
        let record = Record::from_meta(&meta_fixture());
        assert_eq!(record.meta.get("campus"), Some(&json!("appalachian")));
        // reserved keys are consumed, never duplicated into meta
        assert!(!record.meta.contains_key("type"));
        assert!(!record.meta.contains_key("parsed"));
        assert!(!record.meta.contains_key("name"));
    }

    #[test]
    fn validation_is_idempotent() {
        let record = valid_record();
        assert!(record.is_valid());
        assert!(record.is_valid());
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let mut record = valid_record();
        record.name.clear();
        assert!(!record.is_valid());

        let mut record = valid_record();
        record.timestamp = 0;
        assert!(!record.is_valid());

        let mut record = valid_record();
        record.coord.lat = 120.0;
        assert!(!record.is_valid());
    }

    #[test]
    fn validation_rejects_empty_unit() {
        let mut record = valid_record();
        record.data.insert(
            0,
            RecordPoint {
                index: Some(0),
                name: None,
                unit: String::new(),
                value: Some(1.0),
            },
        );
        assert!(!record.is_valid());
    }

    #[test]
    fn wire_form_uses_type_and_coord_keys() {
        let record = valid_record();
        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc["type"], json!("WIND"));
        assert!(doc["coord"]["lon"].is_f64());
        assert!(doc.get("device_type").is_none());
    }

    #[test]
    fn point_defaults_to_dimensionless() {
        let point: RecordPoint = serde_json::from_str("{\"value\": 1.5}").unwrap();
        assert_eq!(point.unit, "dimensionless");
        assert_eq!(RecordPoint::null().value, None);
    }
}

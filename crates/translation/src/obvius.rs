//! Obvius AcquiSuite payload translator.
//!
//! The AcquiSuite reports every attached device as XML: a top-level error
//! sentinel, then per-device blocks of numbered points with vendor unit
//! labels. Translation walks the blocks, normalizes labels to canonical
//! units, and derives the device type's enriched fields.

use contracts::{DeviceType, MetaMap, Record, RecordPoint};
use tracing::{debug, instrument, warn};

use crate::units::UnitRegistry;
use crate::{now_unix, parsed_directives, Translator};

/// Translator for Obvius AcquiSuite XML payloads.
pub struct ObviusTranslator {
    units: UnitRegistry,
}

impl ObviusTranslator {
    pub fn new() -> Self {
        Self {
            units: UnitRegistry::new(),
        }
    }

    /// Build one record per `<record>` element of a `<device>` block.
    fn translate_device(
        &self,
        device: roxmltree::Node<'_, '_>,
        base: &Record,
        directives: &[(String, u32)],
        out: &mut Vec<Record>,
    ) {
        let device_name = device
            .descendants()
            .find(|n| n.has_tag_name("name"))
            .and_then(|n| n.text())
            .unwrap_or_default()
            .to_string();

        for rec_node in device.descendants().filter(|n| n.has_tag_name("record")) {
            let mut record = base.clone();
            record.device_name = device_name.clone();
            record.timestamp = now_unix();
            record.data = self.collect_points(rec_node);
            record.parsed = self.derive_parsed(&record, directives);
            out.push(record);
        }
    }

    /// Collect the raw points of one `<record>`, keyed and ordered by the
    /// reported point number.
    fn collect_points(
        &self,
        rec_node: roxmltree::Node<'_, '_>,
    ) -> std::collections::BTreeMap<u32, RecordPoint> {
        let mut points = std::collections::BTreeMap::new();

        for point in rec_node.descendants().filter(|n| n.has_tag_name("point")) {
            let Some(number) = point.attribute("number").and_then(|v| v.parse().ok()) else {
                warn!("point without usable number attribute, skipping");
                continue;
            };

            // unreadable values stay null rather than failing the record
            let value = point.attribute("value").and_then(|v| v.parse().ok());
            let unit = self.units.canonical(point.attribute("units").unwrap_or(""));

            points.insert(
                number,
                RecordPoint {
                    index: Some(number),
                    name: point.attribute("name").map(str::to_string),
                    unit: unit.to_string(),
                    value,
                },
            );
        }

        points
    }

    /// Derive the enriched field map from directives and the device type's
    /// required-field table.
    ///
    /// Every required field ends up present: unresolvable fields fall back to
    /// a null dimensionless point so downstream consumers see a stable shape.
    fn derive_parsed(
        &self,
        record: &Record,
        directives: &[(String, u32)],
    ) -> std::collections::BTreeMap<String, RecordPoint> {
        let mut parsed = std::collections::BTreeMap::new();
        let device_type = record.device_type;

        if device_type.fields().is_empty() {
            return parsed;
        }

        for (field, point_index) in directives {
            let Some(required_unit) = device_type.required_unit(field) else {
                warn!(
                    record = %record.name,
                    field = %field,
                    "directive for a field the device type does not declare, ignoring"
                );
                continue;
            };

            let Some(point) = record.data.get(point_index) else {
                warn!(
                    record = %record.name,
                    field = %field,
                    point = point_index,
                    "directive points at a missing raw point, ignoring"
                );
                continue;
            };

            let value = match point.value {
                Some(v) => match self.units.convert(v, &point.unit, required_unit) {
                    Ok(converted) => Some(converted),
                    Err(e) => {
                        warn!(
                            record = %record.name,
                            field = %field,
                            error = %e,
                            "cannot convert directive point, leaving null"
                        );
                        None
                    }
                },
                None => None,
            };

            parsed.insert(
                field.clone(),
                RecordPoint {
                    index: Some(*point_index),
                    name: point.name.clone(),
                    unit: required_unit.to_string(),
                    value,
                },
            );
        }

        for (field, _) in device_type.fields() {
            if !parsed.contains_key(*field) {
                warn!(
                    record = %record.name,
                    field = %field,
                    "missing directive for required field, setting null point"
                );
                parsed.insert((*field).to_string(), RecordPoint::null());
            }
        }

        parsed
    }
}

impl Default for ObviusTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for ObviusTranslator {
    /// A payload is valid when its first error sentinel reads `0`.
    fn validate(&self, raw: &str) -> bool {
        let Ok(doc) = roxmltree::Document::parse(raw) else {
            return false;
        };

        doc.descendants()
            .find(|n| n.has_tag_name("error"))
            .and_then(|n| n.text())
            .and_then(|t| t.trim().parse::<i64>().ok())
            == Some(0)
    }

    #[instrument(name = "obvius_translate", skip_all, fields(bytes = raw.len()))]
    fn translate(&self, raw: &str, meta: &MetaMap) -> Vec<Record> {
        if !self.validate(raw) {
            warn!("payload reports an error or is unparsable, discarding");
            return Vec::new();
        }

        // validate() proved this parses
        let Ok(doc) = roxmltree::Document::parse(raw) else {
            return Vec::new();
        };

        let mut base = Record::from_meta(meta);
        match Record::meta_device_tag(meta) {
            Some(tag) => match DeviceType::from_tag(&tag) {
                Some(device_type) => base.device_type = device_type,
                None => {
                    warn!(tag = %tag, record = %base.name, "unrecognized device type tag, discarding payload");
                    return Vec::new();
                }
            },
            None => {
                warn!(record = %base.name, "no device type configured, defaulting to {}", DeviceType::Unknown);
            }
        }

        let directives = parsed_directives(meta);
        let mut records = Vec::new();

        for device in doc.descendants().filter(|n| n.has_tag_name("device")) {
            self.translate_device(device, &base, &directives, &mut records);
        }

        debug!(records = records.len(), "payload translated");
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::DIMENSIONLESS;
    use serde_json::json;

    const WIND_PAYLOAD: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<DAS>
    <name>001EC600070F</name>
    <serial>001EC600070F</serial>
    <devices>
        <device>
            <name>Broyhill Wind Turbine</name>
            <address>4</address>
            <type>Turbine</type>
            <class>8000</class>
            <status>Ok</status>
            <numpoints>16</numpoints>
            <records>
                <record>
                    <time zone="UTC">2017-02-24 16:06:22</time>
                    <age units="seconds">59</age>
                    <error text="Ok">0</error>
                    <point number="0" name="Inverter Reactive Power" units="kVAR" value="0.214" />
                    <point number="1" name="Inverter Real Power" units="kW" value="1.153" />
                    <point number="2" name="RMS Line Voltage Phase A-N" units="Volts" value="278.874" />
                    <point number="5" name="RMS Line Current Phase A" units="Amps" value="2.961" />
                    <point number="8" name="Grid Frequency" units="Hz" value="59.985" />
                    <point number="9" name="Ambient Temperature" units="Degrees F" value="59.756" />
                    <point number="10" name="Rotor Speed" units="RPM" value="32.819" />
                    <point number="11" name="Inverter Energy Total" units="kWh" value="790338.000" />
                    <point number="12" name="Wind Speed (10 minute average)" units="MPH" value="7.843" />
                    <point number="15" name="Turbine Run Time" units="hours" value="49126.903" />
                </record>
            </records>
        </device>
    </devices>
</DAS>"#;

    fn wind_meta() -> MetaMap {
        let mut meta = MetaMap::new();
        meta.insert("name".into(), json!("broyhill_wind"));
        meta.insert("type".into(), json!("WIND"));
        meta.insert("ttl".into(), json!(300));
        meta.insert("lon".into(), json!(-81.6861));
        meta.insert("lat".into(), json!(36.2168));
        meta.insert(
            "parsed".into(),
            json!({
                "inverter_real": {"point": 1},
                "inverter_energy_total": {"point": 11},
                "rotor_speed": {"point": 10},
                "wind_speed": {"point": 12},
            }),
        );
        meta
    }

    fn error_payload() -> String {
        WIND_PAYLOAD.replace(r#"<error text="Ok">0</error>"#, r#"<error text="Fail">1</error>"#)
    }

    #[test]
    fn test_validate_error_sentinel() {
        let translator = ObviusTranslator::new();
        assert!(translator.validate(WIND_PAYLOAD));
        assert!(!translator.validate(&error_payload()));
        assert!(!translator.validate("not xml at all"));
        assert!(!translator.validate("<DAS></DAS>"));
    }

    #[test]
    fn test_translate_wind_payload() {
        let translator = ObviusTranslator::new();
        let records = translator.translate(WIND_PAYLOAD, &wind_meta());
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.name, "broyhill_wind");
        assert_eq!(record.device_name, "Broyhill Wind Turbine");
        assert_eq!(record.device_type, DeviceType::Wind);
        assert_eq!(record.ttl, 300);
        assert!(record.timestamp > 0);
        assert_eq!(record.data.len(), 10);
        assert!(record.is_valid());
    }

    #[test]
    fn test_points_normalized_and_ordered() {
        let translator = ObviusTranslator::new();
        let records = translator.translate(WIND_PAYLOAD, &wind_meta());
        let data = &records[0].data;

        // vendor labels resolved to canonical units
        assert_eq!(data[&0].unit, "kilovolt_ampere");
        assert_eq!(data[&11].unit, "kilowatthour");
        assert_eq!(data[&9].unit, "degF");
        assert_eq!(data[&11].value, Some(790_338.0));

        // keys iterate in point-number order
        let keys: Vec<u32> = data.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_parsed_fields_derived() {
        let translator = ObviusTranslator::new();
        let records = translator.translate(WIND_PAYLOAD, &wind_meta());
        let parsed = &records[0].parsed;

        // every required WIND field is present
        for (field, _) in DeviceType::Wind.fields() {
            assert!(parsed.contains_key(*field), "missing {field}");
        }

        // same-unit directives pass values through unchanged
        assert_eq!(parsed["inverter_energy_total"].value, Some(790_338.0));
        assert_eq!(parsed["inverter_energy_total"].unit, "kilowatthour");
        assert_eq!(parsed["rotor_speed"].value, Some(32.819));
        assert_eq!(parsed["wind_speed"].unit, "mph");
    }

    #[test]
    fn test_missing_directive_yields_null_point() {
        let translator = ObviusTranslator::new();
        let mut meta = wind_meta();
        meta.insert("parsed".into(), json!({"rotor_speed": {"point": 10}}));

        let records = translator.translate(WIND_PAYLOAD, &meta);
        let parsed = &records[0].parsed;

        assert_eq!(parsed["rotor_speed"].value, Some(32.819));
        assert_eq!(parsed["wind_speed"], RecordPoint::null());
        assert_eq!(parsed["wind_speed"].unit, DIMENSIONLESS);
    }

    #[test]
    fn test_undeclared_directive_ignored() {
        let translator = ObviusTranslator::new();
        let mut meta = wind_meta();
        meta.insert(
            "parsed".into(),
            json!({"rotor_speed": {"point": 10}, "bogus_field": {"point": 1}}),
        );

        let records = translator.translate(WIND_PAYLOAD, &meta);
        assert!(!records[0].parsed.contains_key("bogus_field"));
    }

    #[test]
    fn test_error_payload_yields_nothing() {
        let translator = ObviusTranslator::new();
        assert!(translator.translate(&error_payload(), &wind_meta()).is_empty());
        assert!(translator.translate("garbage", &wind_meta()).is_empty());
    }

    #[test]
    fn test_unrecognized_tag_discards_payload() {
        let translator = ObviusTranslator::new();
        let mut meta = wind_meta();
        meta.insert("type".into(), json!("TURBINE"));
        assert!(translator.translate(WIND_PAYLOAD, &meta).is_empty());
    }

    #[test]
    fn test_missing_tag_defaults_to_unknown() {
        let translator = ObviusTranslator::new();
        let mut meta = wind_meta();
        meta.remove("type");

        let records = translator.translate(WIND_PAYLOAD, &meta);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_type, DeviceType::Unknown);
        // unknown devices derive no enriched fields
        assert!(records[0].parsed.is_empty());
    }

    #[test]
    fn test_unparsable_value_is_null() {
        let translator = ObviusTranslator::new();
        let payload = WIND_PAYLOAD.replace(r#"value="32.819""#, r#"value="offline""#);
        let records = translator.translate(&payload, &wind_meta());

        assert_eq!(records[0].data[&10].value, None);
        // directive on a null point stays null in the required unit
        assert_eq!(records[0].parsed["rotor_speed"].value, None);
        assert_eq!(records[0].parsed["rotor_speed"].unit, "rpm");
    }
}

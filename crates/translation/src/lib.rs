//! # Translation
//!
//! Vendor payload translation module.
//!
//! Responsibilities:
//! - Parse raw vendor payloads into canonical `Record`s
//! - Normalize vendor unit labels to canonical physical units
//! - Derive per-device-type enriched fields with unit conversion

mod obvius;
mod units;

pub use obvius::ObviusTranslator;
pub use units::{UnitRegistry, DIMENSIONLESS};

use contracts::{MetaMap, Record, RequesterType};

/// Payload translation trait, one instance per payload dialect.
///
/// Translation never fails hard: a malformed payload yields no records and a
/// log entry, keeping one misbehaving device from affecting the rest.
pub trait Translator: Send {
    /// Cheap payload sanity check; `false` means the payload reports an error
    /// or cannot be parsed at all.
    fn validate(&self, raw: &str) -> bool;

    /// Translate a raw payload into zero or more records.
    fn translate(&self, raw: &str, meta: &MetaMap) -> Vec<Record>;
}

/// Resolve the translator for a requester's payload dialect.
pub fn translator_for(requester_type: RequesterType) -> Box<dyn Translator> {
    match requester_type {
        RequesterType::Obvius => Box::new(ObviusTranslator::new()),
    }
}

/// Directives mapping enriched field names to raw point indices, taken from
/// the `parsed` key of device metadata.
pub(crate) fn parsed_directives(meta: &MetaMap) -> Vec<(String, u32)> {
    let Some(serde_json::Value::Object(map)) = meta.get("parsed") else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(field, spec)| {
            let point = spec.get("point")?.as_u64()?;
            Some((field.clone(), point as u32))
        })
        .collect()
}

/// Record creation timestamp, unix seconds.
pub(crate) fn now_unix() -> i64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        // clock before the epoch, let validation reject the record
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parsed_directives_extracted() {
        let mut meta = MetaMap::new();
        meta.insert(
            "parsed".into(),
            json!({
                "rotor_speed": {"point": 10},
                "wind_speed": {"point": 12},
            }),
        );

        let mut directives = parsed_directives(&meta);
        directives.sort();
        assert_eq!(
            directives,
            vec![("rotor_speed".into(), 10), ("wind_speed".into(), 12)]
        );
    }

    #[test]
    fn test_parsed_directives_tolerate_garbage() {
        let mut meta = MetaMap::new();
        assert!(parsed_directives(&meta).is_empty());

        meta.insert("parsed".into(), json!("not a map"));
        assert!(parsed_directives(&meta).is_empty());

        meta.insert("parsed".into(), json!({"field": {"no_point": 1}}));
        assert!(parsed_directives(&meta).is_empty());
    }

    #[test]
    fn test_translator_for_obvius() {
        let translator = translator_for(RequesterType::Obvius);
        assert!(!translator.validate("not xml"));
    }
}

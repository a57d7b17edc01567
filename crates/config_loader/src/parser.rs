//! Configuration parsing.
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{CollectorBlueprint, CollectorError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<CollectorBlueprint, CollectorError> {
    toml::from_str(content).map_err(|e| CollectorError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<CollectorBlueprint, CollectorError> {
    serde_json::from_str(content).map_err(|e| CollectorError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration content in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<CollectorBlueprint, CollectorError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceType, RequesterSpec, SinkSpec};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[devices]]
name = "broyhill_wind"

[devices.scheduler]
delay_secs = 30.0

[devices.requester]
kind = "obvius"
host = "10.0.0.5"
device_id = 4
user = "readonly"
pass = "secret"

[devices.meta]
type = "WIND"
ttl = 300

[[sinks]]
kind = "log"
name = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.devices.len(), 1);
        assert_eq!(bp.devices[0].name, "broyhill_wind");
        assert!((bp.devices[0].scheduler.delay_secs - 30.0).abs() < 1e-9);
        assert_eq!(
            contracts::Record::meta_device_tag(&bp.devices[0].meta).as_deref(),
            Some(DeviceType::Wind.tag())
        );
        match &bp.devices[0].requester {
            RequesterSpec::Obvius {
                port, timeout_secs, ..
            } => {
                assert_eq!(*port, 80);
                assert_eq!(*timeout_secs, 10);
            }
            other => panic!("expected obvius requester, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "devices": [{
                "name": "lab_meter",
                "scheduler": { "delay_secs": 5.0 },
                "requester": { "kind": "mock", "payload": "<DAS/>" },
                "meta": { "ttl": 60 }
            }],
            "sinks": [
                { "kind": "log", "name": "log" },
                { "kind": "timeseries", "name": "ts", "path": "/tmp/ts.jsonl" }
            ]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.sinks.len(), 2);
        match &bp.sinks[1] {
            SinkSpec::Timeseries {
                clean_delay_secs, ..
            } => assert_eq!(*clean_delay_secs, 300),
            other => panic!("expected timeseries sink, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, CollectorError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}

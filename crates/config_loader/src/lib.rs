//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `CollectorBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Devices: {}", blueprint.devices.len());
//! ```

mod parser;
mod validator;

pub use contracts::CollectorBlueprint;
pub use parser::ConfigFormat;

use contracts::CollectorError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<CollectorBlueprint, CollectorError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CollectorBlueprint, CollectorError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize CollectorBlueprint to TOML string
    pub fn to_toml(blueprint: &CollectorBlueprint) -> Result<String, CollectorError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| CollectorError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize CollectorBlueprint to JSON string
    pub fn to_json(blueprint: &CollectorBlueprint) -> Result<String, CollectorError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| CollectorError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, CollectorError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            CollectorError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            CollectorError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, CollectorError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CollectorBlueprint, CollectorError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[[devices]]
name = "broyhill_wind"

[devices.scheduler]
delay_secs = 30.0

[devices.requester]
kind = "mock"
payload = "<DAS/>"

[devices.meta]
name = "broyhill_wind"
type = "WIND"
ttl = 300
lon = -81.6861
lat = 36.2168

[[devices]]
name = "solar_array"

[devices.scheduler]
delay_secs = 60.0

[devices.requester]
kind = "obvius"
host = "10.0.0.5"
device_id = 4
user = "readonly"
pass = "secret"

[[sinks]]
kind = "log"
name = "log"

[[sinks]]
kind = "document"
name = "docs"
path = "/var/lib/collector/docs"

[engine]
queue_scale = 4
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.devices.len(), 2);
        assert_eq!(bp.queue_capacity(), 8);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.devices.len(), bp2.devices.len());
        assert_eq!(bp.devices[0].name, bp2.devices[0].name);
        assert_eq!(bp.sinks[1].name(), bp2.sinks[1].name());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.devices[0].name, bp2.devices[0].name);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // duplicate device name should fail validation
        let content = r#"
[[devices]]
name = "meter"
[devices.requester]
kind = "mock"
payload = "<DAS/>"

[[devices]]
name = "meter"
[devices.requester]
kind = "mock"
payload = "<DAS/>"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}

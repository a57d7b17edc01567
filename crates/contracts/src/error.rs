//! Layered error definitions
//!
//! Categorized by source: config / payload / unit / sink / record

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum CollectorError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Raw payload could not be parsed
    #[error("payload parse error for device '{device}': {message}")]
    PayloadParse { device: String, message: String },

    /// Record failed schema validation
    #[error("record validation error: {message}")]
    Validation { message: String },

    // ===== Unit Errors =====
    /// Unit token is not registered
    #[error("unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    /// Conversion between incompatible units
    #[error("cannot convert from '{from}' to '{to}'")]
    Conversion { from: String, to: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink or requester endpoint unreachable
    #[error("connectivity error for '{endpoint}': {message}")]
    Connectivity { endpoint: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl CollectorError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create unknown unit error
    pub fn unknown_unit(unit: impl Into<String>) -> Self {
        Self::UnknownUnit { unit: unit.into() }
    }

    /// Create unit conversion error
    pub fn conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create connectivity error
    pub fn connectivity(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

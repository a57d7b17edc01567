//! Engine error types

use thiserror::Error;

/// Engine-specific errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requester creation error
    #[error("failed to create requester for device '{device}': {message}")]
    RequesterCreation { device: String, message: String },

    /// Engine started from an invalid state
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    /// Contract-level error
    #[error(transparent)]
    Contract(#[from] contracts::CollectorError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a requester creation error
    pub fn requester_creation(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequesterCreation {
            device: device.into(),
            message: message.into(),
        }
    }
}

//! Configuration validation.
//!
//! Rules:
//! - device name unique and non-empty
//! - sink name unique and non-empty
//! - scheduler delay finite
//! - mock requester carries exactly one payload source
//! - document / timeseries sinks point at a non-empty path

use std::collections::HashSet;

use contracts::{CollectorBlueprint, CollectorError, RequesterSpec, SinkSpec};

/// Validate a `CollectorBlueprint`.
///
/// Returns the first error encountered, or `Ok(())`.
pub fn validate(blueprint: &CollectorBlueprint) -> Result<(), CollectorError> {
    validate_device_names(blueprint)?;
    validate_schedulers(blueprint)?;
    validate_requesters(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Device names must be unique and non-empty
fn validate_device_names(blueprint: &CollectorBlueprint) -> Result<(), CollectorError> {
    let mut seen = HashSet::new();
    for (idx, device) in blueprint.devices.iter().enumerate() {
        if device.name.is_empty() {
            return Err(CollectorError::config_validation(
                format!("devices[{idx}].name"),
                "device name cannot be empty",
            ));
        }
        if !seen.insert(&device.name) {
            return Err(CollectorError::config_validation(
                format!("devices[name={}]", device.name),
                "duplicate device name",
            ));
        }
    }
    Ok(())
}

/// Scheduler delays must be finite; non-positive values are tolerated and
/// corrected at runtime, NaN/infinity is a config error
fn validate_schedulers(blueprint: &CollectorBlueprint) -> Result<(), CollectorError> {
    for device in &blueprint.devices {
        if !device.scheduler.delay_secs.is_finite() {
            return Err(CollectorError::config_validation(
                format!("devices[{}].scheduler.delay_secs", device.name),
                format!(
                    "delay_secs must be finite, got {}",
                    device.scheduler.delay_secs
                ),
            ));
        }
    }
    Ok(())
}

/// Requester specs must be constructible
fn validate_requesters(blueprint: &CollectorBlueprint) -> Result<(), CollectorError> {
    for device in &blueprint.devices {
        match &device.requester {
            RequesterSpec::Obvius { host, user, .. } => {
                if host.is_empty() {
                    return Err(CollectorError::config_validation(
                        format!("devices[{}].requester.host", device.name),
                        "obvius host cannot be empty",
                    ));
                }
                if user.is_empty() {
                    return Err(CollectorError::config_validation(
                        format!("devices[{}].requester.user", device.name),
                        "obvius user cannot be empty",
                    ));
                }
            }
            RequesterSpec::Mock { payload, fixture } => {
                if payload.is_some() == fixture.is_some() {
                    return Err(CollectorError::config_validation(
                        format!("devices[{}].requester", device.name),
                        "mock requester needs exactly one of payload / fixture",
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Sink names must be unique and non-empty; file-backed sinks need a path
fn validate_sinks(blueprint: &CollectorBlueprint) -> Result<(), CollectorError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name().is_empty() {
            return Err(CollectorError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name()) {
            return Err(CollectorError::config_validation(
                format!("sinks[name={}]", sink.name()),
                "duplicate sink name",
            ));
        }
        match sink {
            SinkSpec::Document { path, .. } | SinkSpec::Timeseries { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(CollectorError::config_validation(
                        format!("sinks[{}].path", sink.name()),
                        "sink path cannot be empty",
                    ));
                }
            }
            SinkSpec::Log { .. } => {}
        }
    }
    Ok(())
}

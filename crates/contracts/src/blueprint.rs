//! CollectorBlueprint - Config Loader output
//!
//! Declarative description of the whole collector: polled devices (scheduler
//! plus requester specs), output sinks, and engine tuning. Every spec carries
//! a discriminator tag (`kind`) selecting the concrete implementation; the
//! remaining keys are constructor arguments, validated at config-load time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::MetaMap;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete collector configuration blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Polled devices, exactly one schedule per device
    pub devices: Vec<DeviceConfig>,

    /// Output sinks
    #[serde(default)]
    pub sinks: Vec<SinkSpec>,

    /// Engine tuning
    #[serde(default)]
    pub engine: EngineSettings,
}

/// One polled device: a scheduler paired with a requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier
    pub name: String,

    /// Trigger schedule, defaulting when the block is omitted
    #[serde(default)]
    pub scheduler: SchedulerSpec,

    /// Payload source
    pub requester: RequesterSpec,

    /// Free-form metadata seeded into every record for this device.
    /// Keys matching record fields (`name`, `lon`, `lat`, `ttl`, `type`,
    /// `parsed`) populate those fields; the rest ride along in `meta`.
    #[serde(default)]
    pub meta: MetaMap,
}

/// Trigger schedule specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Delay between triggers in seconds; non-positive values are corrected
    /// to the 1.0s default at runtime, never fatal
    #[serde(default = "default_delay")]
    pub delay_secs: f64,
}

impl Default for SchedulerSpec {
    fn default() -> Self {
        Self {
            delay_secs: default_delay(),
        }
    }
}

fn default_delay() -> f64 {
    1.0
}

/// Requester specification, tagged by requester kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequesterSpec {
    /// HTTP poller against an Obvius AcquiSuite endpoint
    Obvius {
        host: String,
        #[serde(default = "default_obvius_port")]
        port: u16,
        /// Modbus address of the device behind the AcquiSuite
        device_id: u32,
        user: String,
        pass: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Replays a fixed payload; used for tests and offline runs
    Mock {
        /// Inline payload text
        #[serde(default)]
        payload: Option<String>,
        /// Or a file to read the payload from
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
}

fn default_obvius_port() -> u16 {
    80
}

fn default_timeout() -> u64 {
    10
}

/// Sink specification, tagged by sink kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkSpec {
    /// Logs record summaries
    Log { name: String },
    /// Document store with a per-record-name dedup window
    Document {
        name: String,
        /// Directory documents are written into
        path: PathBuf,
        /// Seconds between accepting records with the same name
        #[serde(default = "default_entry_delay")]
        entry_delay_secs: i64,
    },
    /// Append-only time-series store with a TTL sweep
    Timeseries {
        name: String,
        /// JSONL store file
        path: PathBuf,
        /// Seconds between cleaning passes
        #[serde(default = "default_clean_delay")]
        clean_delay_secs: u64,
    },
}

impl SinkSpec {
    /// The configured sink name.
    pub fn name(&self) -> &str {
        match self {
            Self::Log { name } => name,
            Self::Document { name, .. } => name,
            Self::Timeseries { name, .. } => name,
        }
    }
}

fn default_entry_delay() -> i64 {
    600
}

fn default_clean_delay() -> u64 {
    300
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Queue capacity = registered device count x this factor, fixed at
    /// engine construction
    #[serde(default = "default_queue_scale")]
    pub queue_scale: usize,

    /// Event channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            queue_scale: default_queue_scale(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_queue_scale() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    256
}

impl CollectorBlueprint {
    /// The bounded record queue capacity derived from this blueprint.
    ///
    /// Derived once from the device count; runtime device changes do not
    /// resize the queue.
    pub fn queue_capacity(&self) -> usize {
        (self.devices.len() * self.engine.queue_scale).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blueprint() -> CollectorBlueprint {
        CollectorBlueprint {
            version: ConfigVersion::V1,
            devices: vec![
                DeviceConfig {
                    name: "turbine".into(),
                    scheduler: SchedulerSpec { delay_secs: 30.0 },
                    requester: RequesterSpec::Mock {
                        payload: Some("<DAS/>".into()),
                        fixture: None,
                    },
                    meta: MetaMap::new(),
                },
                DeviceConfig {
                    name: "solar_array".into(),
                    scheduler: SchedulerSpec::default(),
                    requester: RequesterSpec::Obvius {
                        host: "10.0.0.5".into(),
                        port: 80,
                        device_id: 4,
                        user: "readonly".into(),
                        pass: "secret".into(),
                        timeout_secs: 10,
                    },
                    meta: MetaMap::new(),
                },
            ],
            sinks: vec![SinkSpec::Log { name: "log".into() }],
            engine: EngineSettings::default(),
        }
    }

    #[test]
    fn queue_capacity_scales_with_devices() {
        let mut blueprint = sample_blueprint();
        assert_eq!(blueprint.queue_capacity(), 2 * 4);
        blueprint.engine.queue_scale = 10;
        assert_eq!(blueprint.queue_capacity(), 20);
    }

    #[test]
    fn queue_capacity_never_zero() {
        let mut blueprint = sample_blueprint();
        blueprint.devices.clear();
        assert_eq!(blueprint.queue_capacity(), 1);
    }

    #[test]
    fn sink_spec_exposes_name() {
        let spec = SinkSpec::Document {
            name: "docs".into(),
            path: "/tmp/out".into(),
            entry_delay_secs: 600,
        };
        assert_eq!(spec.name(), "docs");
    }

    #[test]
    fn device_without_scheduler_block_gets_default() {
        let json = r#"{"name": "meter", "requester": {"kind": "mock", "payload": "<DAS/>"}}"#;
        let device: DeviceConfig = serde_json::from_str(json).unwrap();
        assert!((device.scheduler.delay_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn requester_spec_tagged_serde() {
        let json = r#"{"kind": "obvius", "host": "h", "device_id": 4, "user": "u", "pass": "p"}"#;
        let spec: RequesterSpec = serde_json::from_str(json).unwrap();
        match spec {
            RequesterSpec::Obvius {
                port, timeout_secs, ..
            } => {
                assert_eq!(port, 80);
                assert_eq!(timeout_secs, 10);
            }
            _ => panic!("expected obvius spec"),
        }
    }
}

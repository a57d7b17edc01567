//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{RequesterSpec, SinkSpec};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    devices: Vec<DeviceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    engine: EngineInfo,
}

#[derive(Serialize)]
struct DeviceInfo {
    name: String,
    delay_secs: f64,
    requester: String,
    #[serde(skip_serializing_if = "contracts::MetaMap::is_empty")]
    meta: contracts::MetaMap,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    kind: String,
}

#[derive(Serialize)]
struct EngineInfo {
    queue_scale: usize,
    channel_capacity: usize,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn describe_requester(spec: &RequesterSpec) -> String {
    match spec {
        RequesterSpec::Obvius {
            host,
            port,
            device_id,
            ..
        } => format!("obvius @ {}:{} (device {})", host, port, device_id),
        RequesterSpec::Mock {
            payload: Some(_), ..
        } => "mock (inline payload)".to_string(),
        RequesterSpec::Mock {
            fixture: Some(path),
            ..
        } => format!("mock (fixture: {})", path.display()),
        RequesterSpec::Mock { .. } => "mock (empty)".to_string(),
    }
}

fn describe_sink(spec: &SinkSpec) -> String {
    match spec {
        SinkSpec::Log { .. } => "log".to_string(),
        SinkSpec::Document {
            path, entry_delay_secs, ..
        } => format!(
            "document @ {} (dedup window {}s)",
            path.display(),
            entry_delay_secs
        ),
        SinkSpec::Timeseries {
            path, clean_delay_secs, ..
        } => format!(
            "timeseries @ {} (sweep every {}s)",
            path.display(),
            clean_delay_secs
        ),
    }
}

fn build_config_info(blueprint: &contracts::CollectorBlueprint, args: &InfoArgs) -> ConfigInfo {
    let devices: Vec<DeviceInfo> = blueprint
        .devices
        .iter()
        .map(|d| DeviceInfo {
            name: d.name.clone(),
            delay_secs: d.scheduler.delay_secs,
            requester: describe_requester(&d.requester),
            meta: if args.devices {
                d.meta.clone()
            } else {
                contracts::MetaMap::new()
            },
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name().to_string(),
                kind: describe_sink(s),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        devices,
        sinks,
        engine: EngineInfo {
            queue_scale: blueprint.engine.queue_scale,
            channel_capacity: blueprint.engine.channel_capacity,
            queue_capacity: blueprint.queue_capacity(),
        },
    }
}

fn print_config_info(blueprint: &contracts::CollectorBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Gridpoll Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Engine info
    println!("⚙️  Engine");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Queue scale: {}", blueprint.engine.queue_scale);
    println!("   ├─ Queue capacity: {}", blueprint.queue_capacity());
    println!(
        "   └─ Channel capacity: {}",
        blueprint.engine.channel_capacity
    );

    // Devices
    println!("\n🔌 Devices ({})", blueprint.devices.len());
    for (i, device) in blueprint.devices.iter().enumerate() {
        let is_last = i == blueprint.devices.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} (every {}s)",
            prefix, device.name, device.scheduler.delay_secs
        );
        println!(
            "   {}  └─ {}",
            child_prefix,
            describe_requester(&device.requester)
        );

        if args.devices && !device.meta.is_empty() {
            println!("   {}     meta:", child_prefix);
            for (key, value) in &device.meta {
                println!("   {}       {} = {}", child_prefix, key, value);
            }
        }
    }

    // Sinks
    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!("   {} {} - {}", prefix, sink.name(), describe_sink(sink));
            } else {
                println!("   {} {}", prefix, sink.name());
            }
        }
    }

    println!();
}

//! Mock Collector Demo
//!
//! Runs the full collector pipeline against a mock requester replaying a
//! fixed AcquiSuite payload. No live devices are required.
//!
//! Run with: cargo run --bin mock_collector [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use engine::Engine;
use serde_json::json;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Collector Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Create a minimal test blueprint
        create_test_blueprint()
    };

    tracing::info!(
        devices = blueprint.devices.len(),
        sinks = blueprint.sinks.len(),
        queue_capacity = blueprint.queue_capacity(),
        "Blueprint ready"
    );

    // ==== Stage 2: Build the engine ====
    let engine = Engine::from_blueprint(&blueprint)?;

    // ==== Stage 3: Run for a few seconds, then drain ====
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = engine.spawn(shutdown_rx);

    tracing::info!("Collector running for 5 seconds...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    tracing::info!("Draining...");
    let _ = shutdown_tx.send(true);
    let summary = handle.await?;

    println!("{summary}");
    Ok(())
}

fn create_test_blueprint() -> contracts::CollectorBlueprint {
    use contracts::*;

    const PAYLOAD: &str = r#"<DAS>
  <devices>
    <device>
      <name>Demo Wind Turbine</name>
      <records>
        <record>
          <error text="Ok">0</error>
          <point number="1" name="Inverter Real Power" units="kW" value="1.153" />
          <point number="10" name="Rotor Speed" units="RPM" value="32.819" />
          <point number="11" name="Inverter Energy Total" units="kWh" value="790338.0" />
          <point number="12" name="Wind Speed" units="MPH" value="7.843" />
        </record>
      </records>
    </device>
  </devices>
</DAS>"#;

    let mut meta = MetaMap::new();
    meta.insert("name".into(), json!("demo_wind"));
    meta.insert("type".into(), json!("WIND"));
    meta.insert("ttl".into(), json!(300));
    meta.insert(
        "parsed".into(),
        json!({
            "inverter_real": {"point": 1},
            "rotor_speed": {"point": 10},
            "inverter_energy_total": {"point": 11},
            "wind_speed": {"point": 12},
        }),
    );

    CollectorBlueprint {
        version: ConfigVersion::V1,
        devices: vec![DeviceConfig {
            name: "demo_wind".to_string(),
            scheduler: SchedulerSpec { delay_secs: 1.0 },
            requester: RequesterSpec::Mock {
                payload: Some(PAYLOAD.to_string()),
                fixture: None,
            },
            meta,
        }],
        sinks: vec![
            SinkSpec::Log {
                name: "log".to_string(),
            },
            SinkSpec::Timeseries {
                name: "ts".to_string(),
                path: std::env::temp_dir().join("mock_collector_store.jsonl"),
                clean_delay_secs: 60,
            },
        ],
        engine: EngineSettings::default(),
    }
}

//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot checks
//! - Mock e2e runs (no live devices required)
//! - Config-to-engine wiring

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use engine::Engine;
    use tokio::sync::watch;
    use tokio::time::sleep;

    const WIND_PAYLOAD: &str = r#"<DAS>
  <name>AcquiSuite Gateway</name>
  <devices>
    <device>
      <name>Broyhill Wind Turbine</name>
      <address>250</address>
      <type>Power Meter</type>
      <records>
        <record>
          <time zone="UTC">2017-02-24 16:26:22</time>
          <error text="Ok">0</error>
          <point number="0" name="Energy" units="kWh" value="790338.0" />
          <point number="3" name="Power" units="kW" value="11.2" />
          <point number="10" name="Rotor Speed" units="RPM" value="14.1" />
        </record>
      </records>
    </device>
  </devices>
</DAS>"#;

    fn e2e_config(doc_dir: &str, store_path: &str) -> String {
        format!(
            r#"
[[devices]]
name = "turbine"

[devices.scheduler]
delay_secs = 0.01

[devices.requester]
kind = "mock"
payload = '''{WIND_PAYLOAD}'''

[devices.meta]
name = "broyhill_wind"
lon = -81.6861
lat = 36.2168
ttl = 300
type = "WIND"

[devices.meta.parsed.rotor_speed]
point = 10

[[sinks]]
kind = "log"
name = "log"

[[sinks]]
kind = "document"
name = "docs"
path = "{doc_dir}"
entry_delay_secs = 600

[[sinks]]
kind = "timeseries"
name = "ts"
path = "{store_path}"
clean_delay_secs = 3600

[engine]
queue_scale = 2
"#
        )
    }

    /// End-to-end: mock requester -> translator -> queue -> sinks
    ///
    /// Verifies the whole data flow:
    /// 1. The scheduler triggers mock polls
    /// 2. Payloads translate into unit-normalized records
    /// 3. Batches reach the document and timeseries stores
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let doc_dir = dir.path().join("docs");
        let store_path = dir.path().join("store.jsonl");

        let config = e2e_config(
            doc_dir.to_str().unwrap(),
            store_path.to_str().unwrap(),
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let engine = Engine::from_blueprint(&blueprint).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = engine.spawn(shutdown_rx);

        // enough ticks to fill the capacity-2 queue several times
        sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Engine shutdown timed out");
        let summary = result.unwrap().unwrap();

        assert!(summary.total_batches >= 1, "expected at least one batch");
        assert!(
            summary.sink_commits.get("ts").copied().unwrap_or(0) >= 1,
            "timeseries sink never committed"
        );

        // the dedup window admits each record name once per 600s, so the
        // repeated polls collapse into a single document
        let documents: Vec<_> = fs::read_dir(&doc_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        assert_eq!(documents.len(), 1, "dedup window should admit one document");

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(documents[0].path()).unwrap()).unwrap();
        assert_eq!(document["name"], "broyhill_wind");
        assert_eq!(document["device_name"], "Broyhill Wind Turbine");
        assert_eq!(document["type"], "WIND");

        // every accepted record lands in the timeseries store
        let store = fs::read_to_string(&store_path).unwrap();
        let lines: Vec<&str> = store.lines().collect();
        assert!(!lines.is_empty(), "timeseries store is empty");

        for line in &lines {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(record["name"], "broyhill_wind");
            assert_eq!(record["ttl"], 300);
            // kWh normalizes to the canonical energy unit
            assert_eq!(record["data"]["0"]["unit"], "kilowatthour");
            // parsed directive resolves point 10 into the wind field table
            assert_eq!(record["parsed"]["rotor_speed"]["value"], 14.1);
        }
    }

    /// Loading the same blueprint from JSON produces an equivalent engine
    #[tokio::test]
    async fn test_json_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let doc_dir = dir.path().join("docs");
        let store_path = dir.path().join("store.jsonl");

        let toml_config = e2e_config(
            doc_dir.to_str().unwrap(),
            store_path.to_str().unwrap(),
        );
        let blueprint = ConfigLoader::load_from_str(&toml_config, ConfigFormat::Toml).unwrap();

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        assert_eq!(from_json.devices.len(), blueprint.devices.len());
        assert_eq!(from_json.sinks.len(), blueprint.sinks.len());
        assert_eq!(from_json.queue_capacity(), blueprint.queue_capacity());

        let engine = Engine::from_blueprint(&from_json).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = engine.spawn(shutdown_rx);

        sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("engine shutdown timed out")
            .unwrap();

        assert!(summary.total_batches >= 1);
    }

    /// A sink with an unwritable path is excluded while the rest keep running
    #[tokio::test]
    async fn test_unwritable_sink_does_not_stop_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store.jsonl");

        // /proc is not writable, so the document sink fails validation
        let config = e2e_config("/proc/gridpoll-no-such-dir/docs", store_path.to_str().unwrap());
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let engine = Engine::from_blueprint(&blueprint).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = engine.spawn(shutdown_rx);

        sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("engine shutdown timed out")
            .unwrap();

        // the surviving timeseries sink still commits
        assert!(summary.sink_commits.get("ts").copied().unwrap_or(0) >= 1);
        assert!(store_path.exists());
    }
}

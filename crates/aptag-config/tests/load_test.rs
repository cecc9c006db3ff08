#![allow(clippy::unwrap_used)]
// Config file loading: JSON parsing, env overlay, validation.

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;

use aptag_config::{ConfigError, load_config};
use aptag_core::{HostKeyVerification, TagTriple};

const BASIC: &str = r#"{
  "wireless-controllers": [
    { "name": "wlc1.example.net", "port": 830 },
    { "name": "wlc2.example.net", "port": 2022, "host-key": "SHA256:abc" }
  ],
  "ap-tag-map": {
    "aa:bb:cc:dd:ee:ff": { "site-tag": "S1", "policy-tag": "P1", "rf-tag": "R1" }
  },
  "mqtt": {
    "broker": "mqtt.example.net",
    "port": 1883,
    "client-id": "aptag",
    "topic": "aps/announce"
  }
}"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    std::io::Write::write_all(&mut file, contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_loads_original_file_format() {
    let file = write_config(BASIC);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.wireless_controllers.len(), 2);
    assert_eq!(config.wireless_controllers[1].port, 2022);
    assert_eq!(
        config.wireless_controllers[1].host_key.as_deref(),
        Some("SHA256:abc")
    );
    assert_eq!(
        config.ap_tag_map["aa:bb:cc:dd:ee:ff"],
        TagTriple::new("P1", "S1", "R1")
    );
    assert_eq!(config.mqtt.client_id, "aptag");
    assert_eq!(config.netconf.timeout_secs, 30);
    assert_eq!(config.dispatch.max_in_flight, None);
}

#[test]
fn test_translates_to_runtime_config() {
    let file = write_config(BASIC);
    let runtime = load_config(file.path()).unwrap().to_provisioner_config();

    assert_eq!(runtime.controllers[0].name, "wlc1.example.net");
    assert_eq!(runtime.subscription.topic, "aps/announce");
    assert_eq!(runtime.session.timeout, Duration::from_secs(30));
    assert_eq!(runtime.session.host_keys, HostKeyVerification::AcceptUnpinned);
    assert!(!runtime.session.honor_controller_port);
    assert!(runtime.resolve("aa:bb:cc:dd:ee:ff").is_ok());
}

#[test]
fn test_optional_sections() {
    let json = BASIC.replacen(
        "\"mqtt\"",
        r#""netconf": { "timeout-secs": 10, "accept-unknown-host-keys": false, "honor-controller-port": true },
  "dispatch": { "max-in-flight": 4 },
  "mqtt""#,
        1,
    );
    let file = write_config(&json);
    let runtime = load_config(file.path()).unwrap().to_provisioner_config();

    assert_eq!(runtime.session.timeout, Duration::from_secs(10));
    assert_eq!(runtime.session.host_keys, HostKeyVerification::PinnedOnly);
    assert!(runtime.session.honor_controller_port);
    assert_eq!(runtime.max_in_flight, Some(4));
}

#[test]
fn test_missing_file() {
    let err = load_config(Path::new("/nonexistent/aptag/config.json")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn test_malformed_json() {
    let file = write_config("{ \"mqtt\": ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Figment(_))
    ));
}

#[test]
fn test_empty_topic_rejected() {
    let file = write_config(&BASIC.replace("aps/announce", ""));
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "mqtt.topic"));
}

#[test]
fn test_zero_timeout_rejected() {
    let json = BASIC.replacen("\"mqtt\"", r#""netconf": { "timeout-secs": 0 }, "mqtt""#, 1);
    let file = write_config(&json);
    let err = load_config(file.path()).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation { ref field, .. } if field == "netconf.timeout-secs")
    );
}

#[test]
fn test_empty_controller_name_rejected() {
    let file = write_config(&BASIC.replace("wlc1.example.net", " "));
    let err = load_config(file.path()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid wireless-controllers[0].name: must not be empty"
    );
}

#[test]
fn test_env_overlay() {
    Jail::expect_with(|jail| {
        jail.create_file("config.json", BASIC)?;
        jail.set_env("APTAG_MQTT__TOPIC", "aps/override");
        jail.set_env("APTAG_MQTT__CLIENT_ID", "aptag-2");
        jail.set_env("APTAG_NETCONF__TIMEOUT_SECS", "12");

        let config = load_config(Path::new("config.json")).map_err(|e| e.to_string())?;
        assert_eq!(config.mqtt.topic, "aps/override");
        assert_eq!(config.mqtt.client_id, "aptag-2");
        assert_eq!(config.netconf.timeout_secs, 12);
        assert_eq!(config.mqtt.broker, "mqtt.example.net");
        Ok(())
    });
}

use super::settings::{DisconnectPolicy, PartialSettings, Settings};
use super::{load_config, load_config_from};
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.master.host, "127.0.0.1");
    assert_eq!(settings.master.port, 11311);
    assert_eq!(settings.master.notify_timeout(), Duration::from_secs(5));
    assert_eq!(settings.node.master_uri, "ws://127.0.0.1:11311");
    assert_eq!(settings.node.protocols, vec!["websocket".to_string()]);
    assert_eq!(settings.node.disconnect_policy, DisconnectPolicy::Disconnect);
    assert_eq!(settings.logging.level, "info");
}

#[test]
fn test_merge_empty_partial_is_default() {
    let merged = Settings::merge(PartialSettings::default());
    let default = Settings::default();
    assert_eq!(merged.master.port, default.master.port);
    assert_eq!(merged.node.rpc_timeout_ms, default.node.rpc_timeout_ms);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // Run from a temporary directory so load_config picks up
    // config/default.toml from there.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [master]
        host = "0.0.0.0"
        port = 9000

        [node]
        rpc_timeout_ms = 250
        disconnect_policy = "keep"
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();
    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.master.host, "0.0.0.0");
    assert_eq!(cfg.master.port, 9000);
    assert_eq!(cfg.master.advertise_host, "127.0.0.1");
    assert_eq!(cfg.node.rpc_timeout_ms, 250);
    assert_eq!(cfg.node.disconnect_policy, DisconnectPolicy::Keep);
}

#[test]
#[serial]
fn load_config_from_explicit_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("graph.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").expect("write config file");

    let cfg = load_config_from(Some(&path)).expect("load_config_from failed");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.master.port, 11311);
}

#[test]
#[serial]
fn load_config_missing_explicit_file_fails() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("absent.toml");
    assert!(load_config_from(Some(&path)).is_err());
}

#[test]
#[serial]
fn load_config_from_environment() {
    temp_env::with_vars(
        [
            ("ROSMASTER__MASTER__PORT", Some("12000")),
            ("ROSMASTER__NODE__MASTER_URI", Some("ws://10.0.0.1:12000")),
            ("ROSMASTER__NODE__PROTOCOLS", Some("websocket,udp")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.master.port, 12000);
            assert_eq!(cfg.node.master_uri, "ws://10.0.0.1:12000");
            assert_eq!(
                cfg.node.protocols,
                vec!["websocket".to_string(), "udp".to_string()]
            );
        },
    );
}

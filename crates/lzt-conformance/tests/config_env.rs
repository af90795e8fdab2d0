//! Configuration layering: defaults, file, environment.

use lzt_conformance::{BackendKind, FlagComparison, HarnessConfig, ReportFormat};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "LZT_BACKEND",
    "LZT_LOADER_PATH",
    "LZT_TOPOLOGY",
    "LZT_FILTER",
    "LZT_STRICT_SKIPS",
    "LZT_FLAG_COMPARISON",
    "LZT_FORMAT",
    "LZT_LOG_LEVEL",
];

fn clear_env() {
    for var in ENV_VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn set(var: &str, value: &str) {
    unsafe {
        env::set_var(var, value);
    }
}

#[test]
#[serial(lzt_env)]
fn environment_overrides_defaults() {
    clear_env();
    set("LZT_BACKEND", "fake");
    set("LZT_TOPOLOGY", "/tmp/topology.toml");
    set("LZT_STRICT_SKIPS", "yes");
    set("LZT_FLAG_COMPARISON", "masked");
    set("LZT_FORMAT", "JSON");

    let config = HarnessConfig::load_with_precedence(None).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Fake);
    assert_eq!(config.backend.topology.as_deref(), Some(Path::new("/tmp/topology.toml")));
    assert!(config.run.strict_skips);
    assert_eq!(config.run.flag_comparison, FlagComparison::Masked);
    assert_eq!(config.output.format, ReportFormat::Json);
    config.validate().unwrap();

    clear_env();
}

#[test]
#[serial(lzt_env)]
fn environment_overrides_file_and_file_overrides_defaults() {
    clear_env();
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    file.write_all(
        br#"
[run]
filter = "device_get.*"
strict_skips = true

[logging]
level = "info"
"#,
    )
    .unwrap();
    set("LZT_FILTER", "sku_consistency.*");

    let config = HarnessConfig::load_with_precedence(Some(file.path())).unwrap();
    assert_eq!(config.run.filter.as_deref(), Some("sku_consistency.*"));
    assert!(config.run.strict_skips);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.backend.kind, BackendKind::Loader);

    clear_env();
}

#[test]
#[serial(lzt_env)]
fn invalid_environment_values_are_errors() {
    for (var, value) in [
        ("LZT_BACKEND", "opencl"),
        ("LZT_STRICT_SKIPS", "maybe"),
        ("LZT_FLAG_COMPARISON", "xor"),
        ("LZT_FORMAT", "yaml"),
    ] {
        clear_env();
        set(var, value);
        let mut config = HarnessConfig::default();
        assert!(config.apply_env_overrides().is_err(), "{var}={value} should be rejected");
    }
    clear_env();
}

#[test]
#[serial(lzt_env)]
fn empty_environment_values_are_ignored() {
    clear_env();
    set("LZT_BACKEND", "");
    let config = HarnessConfig::load_with_precedence(None).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Loader);
    clear_env();
}

#[test]
#[serial(lzt_env)]
fn fake_backend_opens_a_topology_file() {
    clear_env();
    let mut topology = NamedTempFile::with_suffix(".toml").unwrap();
    topology
        .write_all(
            br#"
[[drivers]]
[[drivers.devices]]
[drivers.devices.properties]
vendor_id = 0x8086
device_id = 0x56a0
"#,
        )
        .unwrap();
    set("LZT_BACKEND", "fake");
    set("LZT_TOPOLOGY", topology.path().to_str().unwrap());

    let config = HarnessConfig::load_with_precedence(None).unwrap();
    let api = config.backend.open().unwrap();
    assert_eq!(api.backend_name(), "fake");
    assert_eq!(api.total_device_count().unwrap(), 1);

    clear_env();
}

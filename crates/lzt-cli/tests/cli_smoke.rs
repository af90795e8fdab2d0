use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const ONE_GPU: &str = r#"
[[drivers]]
[[drivers.devices]]
"#;

const TWO_GPUS: &str = r#"
[[drivers]]
[[drivers.devices]]
sub_devices = [{}, {}]
[[drivers.devices]]
sub_devices = [{}, {}]
"#;

const NO_SUB_GROUP_SIZES: &str = r#"
[[drivers]]
[[drivers.devices]]
[drivers.devices.compute]
sub_group_sizes = []
"#;

fn topology(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn lzt() -> Command {
    let mut cmd = Command::cargo_bin("lzt-device").unwrap();
    for var in ["LZT_BACKEND", "LZT_TOPOLOGY", "LZT_FILTER", "LZT_STRICT_SKIPS", "LZT_FORMAT", "LZT_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_works() {
    lzt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("--topology")));
}

#[test]
fn version_works() {
    lzt().arg("--version").assert().success();
}

#[test]
fn list_shows_every_suite() {
    let assert = lzt().arg("list").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for needle in ["device_get.count", "sku_consistency.general", "p2p.can_access_symmetric"] {
        assert!(out.contains(needle), "list missing `{needle}`");
    }
}

#[test]
fn single_device_run_passes_with_skips() {
    let file = topology(ONE_GPU);
    lzt()
        .arg("--topology")
        .arg(file.path())
        .arg("run")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("SKIP p2p.properties"))
        .stdout(predicate::str::contains("0 failed, 10 skipped"));
}

#[test]
fn strict_skips_fail_the_run() {
    let file = topology(ONE_GPU);
    lzt().arg("--topology").arg(file.path()).args(["run", "--strict-skips"]).assert().code(1);
}

#[test]
fn conformance_failure_exits_with_one() {
    let file = topology(NO_SUB_GROUP_SIZES);
    lzt()
        .arg("--topology")
        .arg(file.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL compute_properties.valid"));
}

#[test]
fn json_report_is_machine_readable() {
    let file = topology(TWO_GPUS);
    let assert = lzt()
        .arg("--topology")
        .arg(file.path())
        .args(["run", "--format", "json", "--filter", "sku_consistency.*"])
        .assert()
        .code(0);
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["backend"], "fake");
    assert_eq!(json["passed"], 8);
    assert_eq!(json["cases"].as_array().unwrap().len(), 8);
}

#[test]
fn devices_lists_sku_groups() {
    let file = topology(TWO_GPUS);
    lzt()
        .arg("--topology")
        .arg(file.path())
        .arg("devices")
        .assert()
        .success()
        .stdout(predicate::str::contains("8086:56a0 x2"));
}

#[test]
fn capture_output_replays() {
    let source = topology(TWO_GPUS);
    let captured = NamedTempFile::with_suffix(".toml").unwrap();
    lzt()
        .arg("--topology")
        .arg(source.path())
        .args(["capture", "-o"])
        .arg(captured.path())
        .assert()
        .success();
    lzt()
        .arg("--topology")
        .arg(captured.path())
        .args(["run", "--filter", "sku_consistency.*,sub_devices.*"])
        .assert()
        .code(0);
}

#[test]
fn missing_topology_is_an_environment_error() {
    lzt().args(["--topology", "/nonexistent/topology.toml", "run"]).assert().code(2);
}

#[test]
fn missing_loader_is_an_environment_error() {
    lzt()
        .args(["--backend", "loader", "--loader-path", "/nonexistent/libze_loader.so", "run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_arguments_are_usage_errors() {
    lzt().arg("nonexistent-command").assert().code(3);
    lzt().args(["run", "--flag-comparison", "xor"]).assert().code(3);
}

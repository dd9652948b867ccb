//! End-to-end tests for the `nf-cpuinfo` binary.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const XEON_FEATURES: &str = "VENDOR::GenuineIntel,MODEL::E5-2695_v4,CACHE::46080KB,\
ISA::sse,ISA::sse2,ISA::ssse3,ISA::sse4_1,ISA::sse4_2,ISA::avx,ISA::avx2";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A command isolated from any config on the host.
fn nf_cpuinfo(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("nf-cpuinfo");
    cmd.env_remove("NF_CPUINFO_CONFIG")
        .env_remove("NF_CPUINFO_CONFIG_DIR")
        .env_remove("NF_LOG")
        .env_remove("NF_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", home.path());
    cmd
}

fn write_config(dir: &TempDir, cpuinfo: &Path) -> PathBuf {
    let path = dir.path().join("engine.json");
    let body = serde_json::json!({
        "cpuinfo_path": cpuinfo,
        "chunk_size": 256,
        "pci": { "enabled": false },
    });
    fs::write(&path, body.to_string()).expect("write config");
    path
}

#[test]
fn test_scan_prints_feature_line() {
    let home = TempDir::new().expect("temp dir");
    let path = fixture("intel_xeon_e5.cpuinfo");
    nf_cpuinfo(&home)
        .arg("scan")
        .arg(&path)
        .assert()
        .success()
        .stdout(format!("{}:    {}\n", path.display(), XEON_FEATURES));
}

#[test]
fn test_scan_multiple_files_in_order() {
    let home = TempDir::new().expect("temp dir");
    let output = nf_cpuinfo(&home)
        .arg("scan")
        .arg(fixture("intel_xeon_e5.cpuinfo"))
        .arg(fixture("amd_epyc.cpuinfo"))
        .output()
        .expect("run nf-cpuinfo");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(XEON_FEATURES));
    assert!(lines[1].contains("VENDOR::AuthenticAMD,MODEL::EPYC_7502,CACHE::512KB"));
}

#[test]
fn test_scan_unreadable_file_is_partial_failure() {
    let home = TempDir::new().expect("temp dir");
    let missing = home.path().join("missing.cpuinfo");
    nf_cpuinfo(&home)
        .arg("scan")
        .arg(&missing)
        .arg(fixture("amd_epyc.cpuinfo"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(format!("{}:    \n", missing.display())))
        .stdout(predicate::str::contains("MODEL::EPYC_7502"));
}

#[test]
fn test_scan_json_record() {
    let home = TempDir::new().expect("temp dir");
    let output = nf_cpuinfo(&home)
        .args(["--format", "json", "scan"])
        .arg(fixture("amd_epyc.cpuinfo"))
        .output()
        .expect("run nf-cpuinfo");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("one JSON object");
    assert_eq!(value["record"]["vendor_id"], "AuthenticAMD");
    assert_eq!(value["record"]["model_name"], "EPYC_7502");
    assert_eq!(value["record"]["cache_kb"], 512);
    assert_eq!(value["record"]["isa_flags"][0], "sse");
    assert!(value["features"]
        .as_str()
        .expect("features string")
        .starts_with("VENDOR::AuthenticAMD,"));
}

#[test]
fn test_scan_requires_a_path() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home).arg("scan").assert().code(10);
}

#[test]
fn test_state_appends_to_existing_lists() {
    let home = TempDir::new().expect("temp dir");
    let config = write_config(&home, &fixture("intel_xeon_e5.cpuinfo"));
    nf_cpuinfo(&home)
        .arg("--config")
        .arg(&config)
        .args(["state", "--avail", "Gen1"])
        .assert()
        .success()
        .stdout(format!("avail:  Gen1,{0}\nactive: {0}\n", XEON_FEATURES));
}

#[test]
fn test_state_missing_source_leaves_lists() {
    let home = TempDir::new().expect("temp dir");
    let config = write_config(&home, &home.path().join("nope"));
    nf_cpuinfo(&home)
        .arg("--config")
        .arg(&config)
        .args(["state", "--avail", "Gen1", "--active", "Gen1"])
        .assert()
        .code(1)
        .stdout("avail:  Gen1\nactive: Gen1\n");
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let home = TempDir::new().expect("temp dir");
    let config = home.path().join("broken.json");
    fs::write(&config, "{ not json").expect("write config");
    nf_cpuinfo(&home)
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(fixture("amd_epyc.cpuinfo"))
        .assert()
        .code(11)
        .stderr(predicate::str::contains("nf-cpuinfo:"));
}

#[test]
fn test_xlate_command() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .args([
            "xlate",
            "--new",
            "ISA::avx2",
            "--orig",
            "Gen1,ISA::sse,VENDOR::GenuineIntel",
        ])
        .assert()
        .success()
        .stdout("ISA::avx2,Gen1\n");
}

#[test]
fn test_job_xlate_command() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .args(["job-xlate", "ISA::avx2&gpu&MODEL::EPYC_7502"])
        .assert()
        .success()
        .stdout("ISA::avx2&MODEL::EPYC_7502\n");
}

#[test]
fn test_owned_exit_codes() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .args(["owned", "CACHE::512KB"])
        .assert()
        .success()
        .stdout("true\n");
    nf_cpuinfo(&home)
        .args(["owned", "bigmem"])
        .assert()
        .code(2)
        .stdout("false\n");
}

#[test]
fn test_reorder_json() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .args(["-f", "json", "reorder", "b,a"])
        .assert()
        .success()
        .stdout("{\"features\":\"b,a\"}\n");
}

#[cfg(not(feature = "pci"))]
#[test]
fn test_pci_table_needs_pci_build() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .arg("pci-table")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("nf-cpuinfo:"));
}

#[cfg(feature = "pci")]
#[test]
fn test_pci_table_lists_vendors() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .arg("pci-table")
        .assert()
        .success()
        .stdout(predicate::str::contains("0x10DE"));
}

#[test]
fn test_jsonl_logs_go_to_stderr() {
    let home = TempDir::new().expect("temp dir");
    let output = nf_cpuinfo(&home)
        .args(["-v", "--log-format", "jsonl", "owned", "ISA::sse"])
        .output()
        .expect("run nf-cpuinfo");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"true\n");

    let stderr = String::from_utf8(output.stderr).expect("utf8");
    let first: serde_json::Value = serde_json::from_str(
        stderr.lines().next().expect("at least one log line"),
    )
    .expect("jsonl log line");
    assert_eq!(first["event"], "run.started");
    assert!(first["run_id"].as_str().expect("run id").starts_with("run-"));
}

#[test]
fn test_quiet_outranks_rust_log() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .env("RUST_LOG", "debug")
        .args(["-q", "--log-format", "jsonl", "xlate", "--new", "ISA::avx2", "--orig", "Gen1"])
        .assert()
        .success()
        .stdout("ISA::avx2,Gen1\n")
        .stderr("");
}

#[test]
fn test_nf_log_outranks_rust_log() {
    let home = TempDir::new().expect("temp dir");
    nf_cpuinfo(&home)
        .env("RUST_LOG", "debug")
        .env("NF_LOG", "error")
        .args(["--log-format", "jsonl", "job-xlate", "ISA::sse&gpu"])
        .assert()
        .success()
        .stdout("ISA::sse\n")
        .stderr("");
}

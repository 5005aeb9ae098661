mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn aminc() -> Command {
    Command::new(assert_cmd::cargo_bin!("aminc"))
}

#[test]
fn test_it_fails_without_arguments() {
    aminc()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: aminc file [increment]"));
}

#[test]
fn test_it_fails_on_missing_file() {
    let d = tempfile::tempdir().unwrap();
    let missing = d.path().join("nope.xml");

    aminc()
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not open file"));
}

#[test]
fn test_it_reports_the_field() {
    let file = typical_manifest(0x1234).write_temp();
    let before = fs::read(file.path()).unwrap();

    let output = aminc().arg(file.path()).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], format!("Found in {}:", file.path().display()));
    assert!(
        lines[1].starts_with("versionCode 4660 (0x1234) at offset "),
        "unexpected output {}",
        stdout
    );
    assert_eq!(lines.len(), 2);

    // Inspection alone never writes.
    assert_eq!(fs::read(file.path()).unwrap(), before);
}

#[test]
fn test_it_increments_the_field() {
    let file = typical_manifest(7).write_temp();

    aminc()
        .arg(file.path())
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("Incrementing versionCode by 3..."))
        .stdout(predicate::str::contains(
            "Success, the new value read from the manifest file is 10 (0xA)",
        ));

    aminc()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("versionCode 10 (0xA)"));
}

#[test]
fn test_it_accepts_negative_increments() {
    let file = typical_manifest(50).write_temp();

    aminc()
        .args([file.path().to_str().unwrap(), "-8"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Success, the new value read from the manifest file is 42 (0x2A)",
        ));
}

#[test]
fn test_zero_increment_only_inspects() {
    let file = typical_manifest(7).write_temp();
    let before = fs::read(file.path()).unwrap();

    aminc()
        .args([file.path().to_str().unwrap(), "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Incrementing").not());

    assert_eq!(fs::read(file.path()).unwrap(), before);
}

#[test]
fn test_missing_field_is_not_an_error() {
    let file = ManifestBuilder::new()
        .strings(&["manifest"])
        .element(0, vec![])
        .write_temp();

    aminc()
        .args([file.path().to_str().unwrap(), "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("versionCode not found"));
}

#[test]
fn test_zero_value_is_reported_as_not_found() {
    let file = typical_manifest(0).write_temp();
    let before = fs::read(file.path()).unwrap();

    aminc()
        .args([file.path().to_str().unwrap(), "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("versionCode not found"));

    assert_eq!(fs::read(file.path()).unwrap(), before);
}

#[test]
fn test_decode_failure_is_reported() {
    let mut bytes = typical_manifest(1).build();
    bytes[0] = 0x02;
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("AndroidManifest.xml");
    fs::write(&path, bytes).unwrap();

    aminc()
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid resource type (2)"));
}

#[test]
fn test_json_output() {
    let file = typical_manifest(7).write_temp();

    let output = aminc()
        .args([file.path().to_str().unwrap(), "2", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["field"]["name"], "versionCode");
    assert_eq!(report["field"]["value"], 7);
    assert_eq!(report["patch"]["verified"], 9);
    assert_eq!(report["patch"]["increment"], 2);
}

#[test]
fn test_custom_field_flag() {
    let file = ManifestBuilder::new()
        .strings(&["minSdkVersion", "uses-sdk"])
        .element(
            1,
            vec![Attr::Typed {
                name: 0,
                data_type: TYPE_INT_DEC,
                data: 16,
            }],
        )
        .write_temp();

    aminc()
        .args(["--field", "minSdkVersion", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("minSdkVersion 16 (0x10)"));
}

#[test]
fn test_non_numeric_increment_is_a_usage_error() {
    let file = typical_manifest(7).write_temp();
    let before = fs::read(file.path()).unwrap();

    aminc()
        .args([file.path().to_str().unwrap(), "three"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("INCREMENT"));

    assert_eq!(fs::read(file.path()).unwrap(), before);
}

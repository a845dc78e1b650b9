use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn elemx() -> Command {
    let mut cmd = Command::cargo_bin("elemx-app").expect("binary built");
    cmd.env_remove("ELEMX_CONFIG");
    cmd
}

#[test]
fn roundtrip_reports_success() {
    elemx()
        .arg("roundtrip")
        .assert()
        .success()
        .stdout(predicate::str::contains("roundtrip ok"));
}

#[test]
fn template_export_drops_document_identity() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("template.json");
    elemx()
        .args(["export", "--template", "--out"])
        .arg(&out)
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let brick = &value["materials"]["Brick"];
    assert_eq!(brick["is_template"], true);
    assert!(brick.get("numeric_id").is_none());
    assert!(brick.get("stable_id").is_none());
    assert!(value["wall-types"]["Basic 200"].is_object());
}

#[test]
fn exported_catalog_imports_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    let reexport = dir.path().join("reexport.json");
    elemx().args(["export", "--out"]).arg(&catalog).assert().success();

    elemx()
        .arg("import")
        .arg(&catalog)
        .arg("--out")
        .arg(&reexport)
        .assert()
        .success()
        .stdout(predicate::str::contains("failed=0"));
    assert!(reexport.exists());
}

#[test]
fn merge_import_summary_counts_the_canonical_type() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    elemx().args(["export", "--out"]).arg(&catalog).assert().success();

    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&catalog).unwrap()).unwrap();
    let basic = &mut value["wall-types"]["Basic 200"];
    basic["alias_names"] = serde_json::json!(["Generic 200"]);
    for parameter in basic["parameters"].as_array_mut().unwrap() {
        if parameter["name"] == "Function" {
            parameter["scalar_value"] = serde_json::json!("exterior");
        }
    }
    fs::write(&catalog, value.to_string()).unwrap();

    elemx()
        .arg("import")
        .arg(&catalog)
        .arg("--merge-aliases")
        .assert()
        .success()
        .stdout(predicate::str::contains("merged=1"))
        .stdout(predicate::str::contains("failed=0"))
        .stdout(predicate::str::contains("parameter_errors=1"));
}

#[test]
fn missing_catalog_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    elemx()
        .arg("import")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load catalog"));
}

#[test]
fn config_file_controls_export_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("elemx.toml");
    fs::write(&config, "[export]\npretty = false\n").unwrap();

    let output = elemx()
        .arg("--config")
        .arg(&config)
        .arg("export")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);
}
